//! Data element dictionary entries, derived from DICOM PS3.6 and PS3.7.
// Automatically generated. Edit at your own risk.

use crate::header::{VM, VR};

/// A dictionary record for a single attribute.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Entry {
    /// the attribute tag as a 32-bit number, repeating groups zeroed out
    pub tag: u32,
    /// the canonical attribute keyword
    pub keyword: &'static str,
    /// the standard value representation
    pub vr: VR,
    /// the standard value multiplicity
    pub vm: VM,
}

const fn e(tag: u32, keyword: &'static str, vr: VR, vm: VM) -> Entry {
    Entry {
        tag,
        keyword,
        vr,
        vm,
    }
}

/// The tag at which the entry tables are split.
pub(crate) const SPLIT_TAG: u32 = 0x0028_0000;

/// Entries with tags below [`SPLIT_TAG`], in ascending tag order.
#[rustfmt::skip]
pub(crate) static ENTRIES_LOWER: &[Entry] = &[
    e(0x0000_0000, "CommandGroupLength", VR::UL, VM::Single),
    e(0x0000_0002, "AffectedSOPClassUID", VR::UI, VM::Single),
    e(0x0000_0100, "CommandField", VR::US, VM::Single),
    e(0x0000_0110, "MessageID", VR::US, VM::Single),
    e(0x0000_0120, "MessageIDBeingRespondedTo", VR::US, VM::Single),
    e(0x0000_0800, "CommandDataSetType", VR::US, VM::Single),
    e(0x0000_0900, "Status", VR::US, VM::Single),
    e(0x0002_0000, "FileMetaInformationGroupLength", VR::UL, VM::Single),
    e(0x0002_0001, "FileMetaInformationVersion", VR::OB, VM::Single),
    e(0x0002_0002, "MediaStorageSOPClassUID", VR::UI, VM::Single),
    e(0x0002_0003, "MediaStorageSOPInstanceUID", VR::UI, VM::Single),
    e(0x0002_0010, "TransferSyntaxUID", VR::UI, VM::Single),
    e(0x0002_0012, "ImplementationClassUID", VR::UI, VM::Single),
    e(0x0002_0013, "ImplementationVersionName", VR::SH, VM::Single),
    e(0x0002_0016, "SourceApplicationEntityTitle", VR::AE, VM::Single),
    e(0x0002_0017, "SendingApplicationEntityTitle", VR::AE, VM::Single),
    e(0x0002_0018, "ReceivingApplicationEntityTitle", VR::AE, VM::Single),
    e(0x0002_0100, "PrivateInformationCreatorUID", VR::UI, VM::Single),
    e(0x0002_0102, "PrivateInformation", VR::OB, VM::Single),
    e(0x0008_0005, "SpecificCharacterSet", VR::CS, VM::OneToMany),
    e(0x0008_0008, "ImageType", VR::CS, VM::Unbounded(2)),
    e(0x0008_0016, "SOPClassUID", VR::UI, VM::Single),
    e(0x0008_0018, "SOPInstanceUID", VR::UI, VM::Single),
    e(0x0008_0020, "StudyDate", VR::DA, VM::Single),
    e(0x0008_0021, "SeriesDate", VR::DA, VM::Single),
    e(0x0008_0022, "AcquisitionDate", VR::DA, VM::Single),
    e(0x0008_0023, "ContentDate", VR::DA, VM::Single),
    e(0x0008_002A, "AcquisitionDateTime", VR::DT, VM::Single),
    e(0x0008_0030, "StudyTime", VR::TM, VM::Single),
    e(0x0008_0031, "SeriesTime", VR::TM, VM::Single),
    e(0x0008_0032, "AcquisitionTime", VR::TM, VM::Single),
    e(0x0008_0033, "ContentTime", VR::TM, VM::Single),
    e(0x0008_0050, "AccessionNumber", VR::SH, VM::Single),
    e(0x0008_0060, "Modality", VR::CS, VM::Single),
    e(0x0008_0064, "ConversionType", VR::CS, VM::Single),
    e(0x0008_0070, "Manufacturer", VR::LO, VM::Single),
    e(0x0008_0080, "InstitutionName", VR::LO, VM::Single),
    e(0x0008_0090, "ReferringPhysicianName", VR::PN, VM::Single),
    e(0x0008_0100, "CodeValue", VR::SH, VM::Single),
    e(0x0008_0102, "CodingSchemeDesignator", VR::SH, VM::Single),
    e(0x0008_0103, "CodingSchemeVersion", VR::SH, VM::Single),
    e(0x0008_0104, "CodeMeaning", VR::LO, VM::Single),
    e(0x0008_0201, "TimezoneOffsetFromUTC", VR::SH, VM::Single),
    e(0x0008_1010, "StationName", VR::SH, VM::Single),
    e(0x0008_1030, "StudyDescription", VR::LO, VM::Single),
    e(0x0008_103E, "SeriesDescription", VR::LO, VM::Single),
    e(0x0008_1040, "InstitutionalDepartmentName", VR::LO, VM::Single),
    e(0x0008_1050, "PerformingPhysicianName", VR::PN, VM::OneToMany),
    e(0x0008_1060, "NameOfPhysiciansReadingStudy", VR::PN, VM::OneToMany),
    e(0x0008_1070, "OperatorsName", VR::PN, VM::OneToMany),
    e(0x0008_1090, "ManufacturerModelName", VR::LO, VM::Single),
    e(0x0008_1110, "ReferencedStudySequence", VR::SQ, VM::Single),
    e(0x0008_1111, "ReferencedPerformedProcedureStepSequence", VR::SQ, VM::Single),
    e(0x0008_1115, "ReferencedSeriesSequence", VR::SQ, VM::Single),
    e(0x0008_1140, "ReferencedImageSequence", VR::SQ, VM::Single),
    e(0x0008_1150, "ReferencedSOPClassUID", VR::UI, VM::Single),
    e(0x0008_1155, "ReferencedSOPInstanceUID", VR::UI, VM::Single),
    e(0x0008_2112, "SourceImageSequence", VR::SQ, VM::Single),
    e(0x0008_2218, "AnatomicRegionSequence", VR::SQ, VM::Single),
    e(0x0008_9215, "DerivationCodeSequence", VR::SQ, VM::Single),
    e(0x0010_0010, "PatientName", VR::PN, VM::Single),
    e(0x0010_0020, "PatientID", VR::LO, VM::Single),
    e(0x0010_0030, "PatientBirthDate", VR::DA, VM::Single),
    e(0x0010_0032, "PatientBirthTime", VR::TM, VM::Single),
    e(0x0010_0040, "PatientSex", VR::CS, VM::Single),
    e(0x0010_1010, "PatientAge", VR::AS, VM::Single),
    e(0x0010_1020, "PatientSize", VR::DS, VM::Single),
    e(0x0010_1030, "PatientWeight", VR::DS, VM::Single),
    e(0x0010_4000, "PatientComments", VR::LT, VM::Single),
    e(0x0018_0015, "BodyPartExamined", VR::CS, VM::Single),
    e(0x0018_0020, "ScanningSequence", VR::CS, VM::OneToMany),
    e(0x0018_0050, "SliceThickness", VR::DS, VM::Single),
    e(0x0018_0060, "KVP", VR::DS, VM::Single),
    e(0x0018_0088, "SpacingBetweenSlices", VR::DS, VM::Single),
    e(0x0018_1000, "DeviceSerialNumber", VR::LO, VM::Single),
    e(0x0018_1020, "SoftwareVersions", VR::LO, VM::OneToMany),
    e(0x0018_1030, "ProtocolName", VR::LO, VM::Single),
    e(0x0018_1151, "XRayTubeCurrent", VR::IS, VM::Single),
    e(0x0018_5100, "PatientPosition", VR::CS, VM::Single),
    e(0x0018_6011, "SequenceOfUltrasoundRegions", VR::SQ, VM::Single),
    e(0x0018_6012, "RegionSpatialFormat", VR::US, VM::Single),
    e(0x0018_6014, "RegionDataType", VR::US, VM::Single),
    e(0x0020_000D, "StudyInstanceUID", VR::UI, VM::Single),
    e(0x0020_000E, "SeriesInstanceUID", VR::UI, VM::Single),
    e(0x0020_0010, "StudyID", VR::SH, VM::Single),
    e(0x0020_0011, "SeriesNumber", VR::IS, VM::Single),
    e(0x0020_0012, "AcquisitionNumber", VR::IS, VM::Single),
    e(0x0020_0013, "InstanceNumber", VR::IS, VM::Single),
    e(0x0020_0020, "PatientOrientation", VR::CS, VM::Fixed(2)),
    e(0x0020_0032, "ImagePositionPatient", VR::DS, VM::Fixed(3)),
    e(0x0020_0037, "ImageOrientationPatient", VR::DS, VM::Fixed(6)),
    e(0x0020_0052, "FrameOfReferenceUID", VR::UI, VM::Single),
    e(0x0020_1041, "SliceLocation", VR::DS, VM::Single),
    e(0x0020_3100, "SourceImageIDs", VR::CS, VM::OneToMany),
    e(0x0020_4000, "ImageComments", VR::LT, VM::Single),
    e(0x0020_9157, "DimensionIndexValues", VR::UL, VM::OneToMany),
];

/// Entries with tags at or above [`SPLIT_TAG`], in ascending tag order.
#[rustfmt::skip]
pub(crate) static ENTRIES_UPPER: &[Entry] = &[
    e(0x0028_0002, "SamplesPerPixel", VR::US, VM::Single),
    e(0x0028_0004, "PhotometricInterpretation", VR::CS, VM::Single),
    e(0x0028_0006, "PlanarConfiguration", VR::US, VM::Single),
    e(0x0028_0008, "NumberOfFrames", VR::IS, VM::Single),
    e(0x0028_0010, "Rows", VR::US, VM::Single),
    e(0x0028_0011, "Columns", VR::US, VM::Single),
    e(0x0028_0030, "PixelSpacing", VR::DS, VM::Fixed(2)),
    e(0x0028_0100, "BitsAllocated", VR::US, VM::Single),
    e(0x0028_0101, "BitsStored", VR::US, VM::Single),
    e(0x0028_0102, "HighBit", VR::US, VM::Single),
    e(0x0028_0103, "PixelRepresentation", VR::US, VM::Single),
    e(0x0028_1050, "WindowCenter", VR::DS, VM::OneToMany),
    e(0x0028_1051, "WindowWidth", VR::DS, VM::OneToMany),
    e(0x0028_1052, "RescaleIntercept", VR::DS, VM::Single),
    e(0x0028_1053, "RescaleSlope", VR::DS, VM::Single),
    e(0x0028_1054, "RescaleType", VR::LO, VM::Single),
    e(0x0028_2110, "LossyImageCompression", VR::CS, VM::Single),
    e(0x0032_1060, "RequestedProcedureDescription", VR::LO, VM::Single),
    e(0x0032_4000, "StudyComments", VR::LT, VM::Single),
    e(0x0040_0244, "PerformedProcedureStepStartDate", VR::DA, VM::Single),
    e(0x0040_0245, "PerformedProcedureStepStartTime", VR::TM, VM::Single),
    e(0x0040_0254, "PerformedProcedureStepDescription", VR::LO, VM::Single),
    e(0x0040_0275, "RequestAttributesSequence", VR::SQ, VM::Single),
    e(0x0040_0555, "AcquisitionContextSequence", VR::SQ, VM::Single),
    e(0x0040_A730, "ContentSequence", VR::SQ, VM::Single),
    e(0x5000_0005, "CurveDimensions", VR::US, VM::Single),
    e(0x5000_0010, "NumberOfPoints", VR::US, VM::Single),
    e(0x5000_0020, "TypeOfData", VR::CS, VM::Single),
    e(0x5000_0030, "AxisUnits", VR::SH, VM::OneToMany),
    e(0x5000_3000, "CurveData", VR::OW, VM::Single),
    e(0x5200_9229, "SharedFunctionalGroupsSequence", VR::SQ, VM::Single),
    e(0x5200_9230, "PerFrameFunctionalGroupsSequence", VR::SQ, VM::Single),
    e(0x6000_0010, "OverlayRows", VR::US, VM::Single),
    e(0x6000_0011, "OverlayColumns", VR::US, VM::Single),
    e(0x6000_0040, "OverlayType", VR::CS, VM::Single),
    e(0x6000_0050, "OverlayOrigin", VR::SS, VM::Fixed(2)),
    e(0x6000_0100, "OverlayBitsAllocated", VR::US, VM::Single),
    e(0x6000_0102, "OverlayBitPosition", VR::US, VM::Single),
    e(0x6000_3000, "OverlayData", VR::OW, VM::Single),
    e(0x7FE0_0008, "FloatPixelData", VR::OF, VM::Single),
    e(0x7FE0_0009, "DoubleFloatPixelData", VR::OD, VM::Single),
    e(0x7FE0_0010, "PixelData", VR::OW, VM::Single),
];
