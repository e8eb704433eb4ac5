/// Source name constants to ensure consistency across the codebase.
/// CLI names are lower-case; labels are what ends up in `source_db`.

// User-friendly source names (used in CLI)
pub const OPENALEX_SOURCE: &str = "openalex";
pub const CROSSREF_SOURCE: &str = "crossref";
pub const HAL_SOURCE: &str = "hal";

// Provenance labels written to canonical records
pub const OPENALEX_LABEL: &str = "OpenAlex";
pub const CROSSREF_LABEL: &str = "Crossref";
pub const HAL_LABEL: &str = "HAL";

// Separator used when a merged record lists every contributing source
pub const SOURCE_DB_SEPARATOR: &str = ", ";

// API endpoints
pub const OPENALEX_WORKS_URL: &str = "https://api.openalex.org/works";
pub const CROSSREF_WORKS_URL: &str = "https://api.crossref.org/works";
pub const HAL_SEARCH_URL: &str = "https://api.archives-ouvertes.fr/search/";

pub const DOI_RESOLVER_PREFIX: &str = "https://doi.org/";

/// Fields requested from HAL. The adapter reads each of these.
pub const HAL_FIELD_LIST: &str =
    "title_s,authFullName_s,publicationDateY_i,publicationDate_s,journalTitle_s,uri_s,docType_s,docid";

/// Get all supported user-friendly source names
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![OPENALEX_SOURCE, CROSSREF_SOURCE, HAL_SOURCE]
}

/// Default Crossref publisher keywords. A Crossref record is kept only when its
/// publisher contains one of these (case-insensitive).
pub const DEFAULT_PUBLISHER_KEYWORDS: &[&str] = &[
    // Core disciplines & theories
    "Philosophy", "Philosophie", "Filosofia", "Filosofía",
    "Literature", "Literary", "Linguistics", "Poetics",
    "Humanities", "Theory", "Critical", "Deconstruction",
    "Phenomenology", "Psychoanalysis", "Aesthetics", "Cultural Studies",
    // Institutional & publisher types
    "University Press", "University", "Press", "Academic",
    "College", "Institute", "Institut", "Centro", "Centre",
    "Society", "Société", "Sociedad",
    // Publication types (English)
    "Journal", "Review", "Studies", "Quarterly", "Annual", "Annals",
    "Proceedings", "Transactions", "Bulletin", "Archive", "Yearbook",
    // French
    "Revue", "Cahiers", "Études", "Annales", "Presses",
    // German
    "Zeitschrift", "Kritik", "Jahrbuch", "Archiv", "Verlag",
    // Italian
    "Rivista", "Studi", "Annali",
    // Spanish / Portuguese
    "Revista", "Estudios", "Anales",
    // Latin
    "Acta",
];
