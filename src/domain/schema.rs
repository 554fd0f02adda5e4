//! Fixed field schema of an ASEAN-India FTA Certificate of Origin.
//!
//! The order of [`FIELDS`] is the column order of every table and export.

use std::fmt;

/// 找不到欄位時的固定標記
pub const SENTINEL: &str = "N/A";

pub const FIELD_COUNT: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    ExportersBusinessName,
    ExportersAddress,
    ExportersCountry,
    ConsigneesName,
    ConsigneesAddress,
    ConsigneesCountry,
    DepartureDate,
    VesselAircraft,
    PortOfDischarge,
    MarksNumbersPackaging,
    NumberTypePackages,
    DescriptionGoods,
    OriginCriterion,
    GrossWeightQuantity,
    ValueFob,
    InvoiceNumberDate,
    ExportingCountry,
    ImportingCountry,
}

pub const FIELDS: [Field; FIELD_COUNT] = [
    Field::ExportersBusinessName,
    Field::ExportersAddress,
    Field::ExportersCountry,
    Field::ConsigneesName,
    Field::ConsigneesAddress,
    Field::ConsigneesCountry,
    Field::DepartureDate,
    Field::VesselAircraft,
    Field::PortOfDischarge,
    Field::MarksNumbersPackaging,
    Field::NumberTypePackages,
    Field::DescriptionGoods,
    Field::OriginCriterion,
    Field::GrossWeightQuantity,
    Field::ValueFob,
    Field::InvoiceNumberDate,
    Field::ExportingCountry,
    Field::ImportingCountry,
];

impl Field {
    /// Position of the field in [`FIELDS`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// JSON key / column key
    pub fn name(self) -> &'static str {
        match self {
            Field::ExportersBusinessName => "exporters_business_name",
            Field::ExportersAddress => "exporters_address",
            Field::ExportersCountry => "exporters_country",
            Field::ConsigneesName => "consignees_name",
            Field::ConsigneesAddress => "consignees_address",
            Field::ConsigneesCountry => "consignees_country",
            Field::DepartureDate => "departure_date",
            Field::VesselAircraft => "vessel_aircraft",
            Field::PortOfDischarge => "port_of_discharge",
            Field::MarksNumbersPackaging => "marks_numbers_packaging",
            Field::NumberTypePackages => "number_type_packages",
            Field::DescriptionGoods => "description_goods",
            Field::OriginCriterion => "origin_criterion",
            Field::GrossWeightQuantity => "gross_weight_quantity",
            Field::ValueFob => "value_fob",
            Field::InvoiceNumberDate => "invoice_number_date",
            Field::ExportingCountry => "exporting_country",
            Field::ImportingCountry => "importing_country",
        }
    }

    /// Spreadsheet header, e.g. `Exporters Business Name`.
    pub fn header(self) -> String {
        self.name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 證書上的欄位名稱
    pub fn label(self) -> &'static str {
        match self {
            Field::ExportersBusinessName => "Exporter's business name",
            Field::ExportersAddress => "Exporter's address",
            Field::ExportersCountry => "Exporter's country",
            Field::ConsigneesName => "Consignee's name",
            Field::ConsigneesAddress => "Consignee's address",
            Field::ConsigneesCountry => "Consignee's country",
            Field::DepartureDate => "Departure date",
            Field::VesselAircraft => "Vessel's name/Aircraft",
            Field::PortOfDischarge => "Port of discharge",
            Field::MarksNumbersPackaging => "Marks and numbers on packaging",
            Field::NumberTypePackages => "Number and type of packages",
            Field::DescriptionGoods => "Description of goods",
            Field::OriginCriterion => "Origin criterion",
            Field::GrossWeightQuantity => "Gross weight or other quantity",
            Field::ValueFob => "Value (FOB)",
            Field::InvoiceNumberDate => "Number and date of invoices",
            Field::ExportingCountry => "Exporting country",
            Field::ImportingCountry => "Importing country",
        }
    }

    /// Where the value sits on the certificate form.
    pub fn location_hint(self) -> &'static str {
        match self {
            Field::ExportersBusinessName => "company name from box 1",
            Field::ExportersAddress => {
                "full address from box 1, including plot/village/taluka/state/pincode"
            }
            Field::ExportersCountry => "country from box 1",
            Field::ConsigneesName => "company name from box 2",
            Field::ConsigneesAddress => "full address from box 2",
            Field::ConsigneesCountry => "country from box 2",
            Field::DepartureDate => "departure date from box 3, as written",
            Field::VesselAircraft => "vessel/aircraft details from box 3",
            Field::PortOfDischarge => "port information from box 3",
            Field::MarksNumbersPackaging => "column 6 of the goods table",
            Field::NumberTypePackages => "package count and type from column 7",
            Field::DescriptionGoods => "goods description from column 7, including the HS code",
            Field::OriginCriterion => "column 8, usually \"WO\" or similar",
            Field::GrossWeightQuantity => "weight/quantity from column 9",
            Field::ValueFob => "FOB value from column 9",
            Field::InvoiceNumberDate => "invoice number and date from column 10",
            Field::ExportingCountry => "exporting country from the box 11 declaration",
            Field::ImportingCountry => "importing country from the box 11 declaration",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        FIELDS.iter().copied().find(|field| field.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn field_names() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|field| field.name())
}

/// 顯示用的欄位分組，每個欄位恰好出現一次
pub const SECTIONS: [(&str, &[Field]); 5] = [
    (
        "Exporter",
        &[
            Field::ExportersBusinessName,
            Field::ExportersAddress,
            Field::ExportersCountry,
        ],
    ),
    (
        "Consignee",
        &[
            Field::ConsigneesName,
            Field::ConsigneesAddress,
            Field::ConsigneesCountry,
        ],
    ),
    (
        "Shipment",
        &[
            Field::DepartureDate,
            Field::VesselAircraft,
            Field::PortOfDischarge,
            Field::ExportingCountry,
            Field::ImportingCountry,
        ],
    ),
    (
        "Goods",
        &[
            Field::MarksNumbersPackaging,
            Field::NumberTypePackages,
            Field::DescriptionGoods,
            Field::OriginCriterion,
            Field::GrossWeightQuantity,
        ],
    ),
    ("Invoice", &[Field::ValueFob, Field::InvoiceNumberDate]),
];
