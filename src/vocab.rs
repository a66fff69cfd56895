//! IRIs of the vocabularies used in the catalog graph.

pub mod rdf {
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

pub mod xsd {
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
}

pub mod dcat {
    pub const NS: &str = "http://www.w3.org/ns/dcat#";
    pub const CATALOG: &str = "http://www.w3.org/ns/dcat#Catalog";
    pub const DATASET: &str = "http://www.w3.org/ns/dcat#Dataset";
    pub const DISTRIBUTION: &str = "http://www.w3.org/ns/dcat#Distribution";
    pub const DATA_SERVICE: &str = "http://www.w3.org/ns/dcat#DataService";
    pub const DATASET_PROP: &str = "http://www.w3.org/ns/dcat#dataset";
    pub const DISTRIBUTION_PROP: &str = "http://www.w3.org/ns/dcat#distribution";
    pub const KEYWORD: &str = "http://www.w3.org/ns/dcat#keyword";
    pub const LANDING_PAGE: &str = "http://www.w3.org/ns/dcat#landingPage";
    pub const CONTACT_POINT: &str = "http://www.w3.org/ns/dcat#contactPoint";
    pub const ACCESS_URL: &str = "http://www.w3.org/ns/dcat#accessURL";
    pub const MEDIA_TYPE: &str = "http://www.w3.org/ns/dcat#mediaType";
    pub const ACCESS_SERVICE: &str = "http://www.w3.org/ns/dcat#accessService";
    pub const ENDPOINT_URL: &str = "http://www.w3.org/ns/dcat#endpointURL";
    pub const ENDPOINT_DESCRIPTION: &str = "http://www.w3.org/ns/dcat#endpointDescription";
    pub const SERVES_DATASET: &str = "http://www.w3.org/ns/dcat#servesDataset";
}

pub mod dct {
    pub const NS: &str = "http://purl.org/dc/terms/";
    pub const TITLE: &str = "http://purl.org/dc/terms/title";
    pub const DESCRIPTION: &str = "http://purl.org/dc/terms/description";
    pub const IDENTIFIER: &str = "http://purl.org/dc/terms/identifier";
    pub const MODIFIED: &str = "http://purl.org/dc/terms/modified";
    pub const ISSUED: &str = "http://purl.org/dc/terms/issued";
    pub const SPATIAL: &str = "http://purl.org/dc/terms/spatial";
    pub const TEMPORAL: &str = "http://purl.org/dc/terms/temporal";
    pub const PUBLISHER: &str = "http://purl.org/dc/terms/publisher";
    pub const LANGUAGE: &str = "http://purl.org/dc/terms/language";
    pub const ACCESS_RIGHTS: &str = "http://purl.org/dc/terms/accessRights";
    pub const CONFORMS_TO: &str = "http://purl.org/dc/terms/conformsTo";
    pub const LICENSE: &str = "http://purl.org/dc/terms/license";
    pub const LOCATION: &str = "http://purl.org/dc/terms/Location";
    pub const STANDARD: &str = "http://purl.org/dc/terms/Standard";
}

pub mod foaf {
    pub const NS: &str = "http://xmlns.com/foaf/0.1/";
    pub const ORGANIZATION: &str = "http://xmlns.com/foaf/0.1/Organization";
    pub const DOCUMENT: &str = "http://xmlns.com/foaf/0.1/Document";
    pub const NAME: &str = "http://xmlns.com/foaf/0.1/name";
    pub const HOMEPAGE: &str = "http://xmlns.com/foaf/0.1/homepage";
}

pub mod vcard {
    pub const NS: &str = "http://www.w3.org/2006/vcard/ns#";
    pub const ORGANIZATION: &str = "http://www.w3.org/2006/vcard/ns#Organization";
    pub const INDIVIDUAL: &str = "http://www.w3.org/2006/vcard/ns#Individual";
    pub const ADDRESS: &str = "http://www.w3.org/2006/vcard/ns#Address";
    pub const FAX: &str = "http://www.w3.org/2006/vcard/ns#Fax";
    pub const VOICE: &str = "http://www.w3.org/2006/vcard/ns#Voice";
    pub const FN: &str = "http://www.w3.org/2006/vcard/ns#fn";
    pub const HAS_MEMBER: &str = "http://www.w3.org/2006/vcard/ns#hasMember";
    pub const ROLE: &str = "http://www.w3.org/2006/vcard/ns#role";
    pub const EMAIL: &str = "http://www.w3.org/2006/vcard/ns#email";
    pub const HAS_ADDRESS: &str = "http://www.w3.org/2006/vcard/ns#hasAddress";
    pub const HAS_TELEPHONE: &str = "http://www.w3.org/2006/vcard/ns#hasTelephone";
    pub const REGION: &str = "http://www.w3.org/2006/vcard/ns#region";
    pub const LOCALITY: &str = "http://www.w3.org/2006/vcard/ns#locality";
    pub const COUNTRY_NAME: &str = "http://www.w3.org/2006/vcard/ns#country-name";
    pub const POSTAL_CODE: &str = "http://www.w3.org/2006/vcard/ns#postal-code";
    pub const STREET_ADDRESS: &str = "http://www.w3.org/2006/vcard/ns#street-address";
}

pub mod time {
    pub const NS: &str = "http://www.w3.org/2006/time#";
    pub const INSTANT: &str = "http://www.w3.org/2006/time#Instant";
    pub const INTERVAL: &str = "http://www.w3.org/2006/time#Interval";
    pub const HAS_BEGINNING: &str = "http://www.w3.org/2006/time#hasBeginning";
    pub const HAS_END: &str = "http://www.w3.org/2006/time#hasEnd";
    pub const IN_XSD_DATE_TIME_STAMP: &str = "http://www.w3.org/2006/time#inXSDDateTimeStamp";
}

pub mod locn {
    pub const NS: &str = "http://www.w3.org/ns/locn#";
    pub const GEOMETRY: &str = "http://www.w3.org/ns/locn#geometry";
    pub const GEO_JSON: &str = "https://www.iana.org/assignments/media-types/application/vnd.geo+json";
}

/// Prefixes declared on a freshly created catalog graph.
pub const DEFAULT_PREFIXES: [(&str, &str); 8] = [
    ("xsd", xsd::NS),
    ("rdf", rdf::NS),
    ("dcat", dcat::NS),
    ("dct", dct::NS),
    ("foaf", foaf::NS),
    ("vcard", vcard::NS),
    ("time", time::NS),
    ("locn", locn::NS),
];
