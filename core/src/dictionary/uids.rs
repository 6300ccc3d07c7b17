//! Transfer syntax UID declarations.

/// Transfer Syntax: Implicit VR Little Endian: Default Transfer Syntax for DICOM
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
/// Transfer Syntax: Explicit VR Little Endian
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
/// Transfer Syntax: Deflated Explicit VR Little Endian
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
/// Transfer Syntax: Explicit VR Big Endian (Retired)
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";
/// Transfer Syntax: JPIP Referenced Deflate
pub const JPIP_REFERENCED_DEFLATE: &str = "1.2.840.10008.1.2.4.95";

/// Whether the given transfer syntax stores the data set in a
/// deflate-compressed form.
pub fn is_deflated(uid: &str) -> bool {
    uid == DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN || uid == JPIP_REFERENCED_DEFLATE
}

/// Whether the given transfer syntax encodes the data set in big endian
/// byte order.
pub fn is_big_endian(uid: &str) -> bool {
    uid == EXPLICIT_VR_BIG_ENDIAN
}

/// Whether the given transfer syntax encodes element headers without an
/// explicit value representation.
pub fn is_implicit_vr(uid: &str) -> bool {
    uid == IMPLICIT_VR_LITTLE_ENDIAN
}
