//! Tag constants for the attributes which this library addresses by name.

use crate::header::Tag;

/// Command Group Length (0000,0000)
pub const COMMAND_GROUP_LENGTH: Tag = Tag(0x0000, 0x0000);
/// File Meta Information Group Length (0002,0000)
pub const FILE_META_INFORMATION_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
/// File Meta Information Version (0002,0001)
pub const FILE_META_INFORMATION_VERSION: Tag = Tag(0x0002, 0x0001);
/// Media Storage SOP Class UID (0002,0002)
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
/// Media Storage SOP Instance UID (0002,0003)
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
/// Transfer Syntax UID (0002,0010)
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
/// Implementation Class UID (0002,0012)
pub const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);
/// Specific Character Set (0008,0005)
pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
/// Image Type (0008,0008)
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);
/// SOP Class UID (0008,0016)
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
/// SOP Instance UID (0008,0018)
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
/// Study Date (0008,0020)
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
/// Series Date (0008,0021)
pub const SERIES_DATE: Tag = Tag(0x0008, 0x0021);
/// Acquisition Date Time (0008,002A)
pub const ACQUISITION_DATE_TIME: Tag = Tag(0x0008, 0x002A);
/// Study Time (0008,0030)
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
/// Accession Number (0008,0050)
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
/// Modality (0008,0060)
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
/// Referring Physician Name (0008,0090)
pub const REFERRING_PHYSICIAN_NAME: Tag = Tag(0x0008, 0x0090);
/// Timezone Offset From UTC (0008,0201)
pub const TIMEZONE_OFFSET_FROM_UTC: Tag = Tag(0x0008, 0x0201);
/// Study Description (0008,1030)
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
/// Referenced Study Sequence (0008,1110)
pub const REFERENCED_STUDY_SEQUENCE: Tag = Tag(0x0008, 0x1110);
/// Referenced SOP Class UID (0008,1150)
pub const REFERENCED_SOP_CLASS_UID: Tag = Tag(0x0008, 0x1150);
/// Referenced SOP Instance UID (0008,1155)
pub const REFERENCED_SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x1155);
/// Patient Name (0010,0010)
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
/// Patient ID (0010,0020)
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
/// Patient Birth Date (0010,0030)
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
/// Patient Sex (0010,0040)
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
/// Patient Weight (0010,1030)
pub const PATIENT_WEIGHT: Tag = Tag(0x0010, 0x1030);
/// Sequence Of Ultrasound Regions (0018,6011)
pub const SEQUENCE_OF_ULTRASOUND_REGIONS: Tag = Tag(0x0018, 0x6011);
/// Study Instance UID (0020,000D)
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
/// Series Instance UID (0020,000E)
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
/// Study ID (0020,0010)
pub const STUDY_ID: Tag = Tag(0x0020, 0x0010);
/// Series Number (0020,0011)
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
/// Instance Number (0020,0013)
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);
/// Image Position (Patient) (0020,0032)
pub const IMAGE_POSITION_PATIENT: Tag = Tag(0x0020, 0x0032);
/// Source Image IDs (0020,3100 to 0020,31FF)
pub const SOURCE_IMAGE_IDS: Tag = Tag(0x0020, 0x3100);
/// Image Comments (0020,4000)
pub const IMAGE_COMMENTS: Tag = Tag(0x0020, 0x4000);
/// Rows (0028,0010)
pub const ROWS: Tag = Tag(0x0028, 0x0010);
/// Columns (0028,0011)
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
/// Overlay Data (60xx,3000)
pub const OVERLAY_DATA: Tag = Tag(0x6000, 0x3000);
/// Pixel Data (7FE0,0010)
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);
/// Item (FFFE,E000)
pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
/// Item Delimitation Item (FFFE,E00D)
pub const ITEM_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE00D);
/// Sequence Delimitation Item (FFFE,E0DD)
pub const SEQUENCE_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE0DD);
