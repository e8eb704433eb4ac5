//! Field-level merge rules for a group of records describing the same work.
//!
//! Each canonical field is bound to a [`MergeStrategy`] in a policy table, so a
//! new field or strategy binding is a table edit, not new control flow.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::constants::SOURCE_DB_SEPARATOR;
use crate::domain::{Author, CanonicalWork};

/// Every mergeable field of `CanonicalWork`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Doi,
    Title,
    Authors,
    Year,
    PublicationDate,
    JournalName,
    Publisher,
    WorkType,
    Abstract,
    Subjects,
    SourceUrl,
    CitationCount,
    SourceDb,
    Relation,
}

impl Field {
    /// Whether `strategy` has a meaning for this field's value shape.
    /// Text fields take every strategy; numbers, lists and the opaque relation map take fewer.
    pub fn supports(self, strategy: MergeStrategy) -> bool {
        use MergeStrategy::*;
        match self {
            Field::Year | Field::CitationCount => matches!(strategy, CoalesceByPriority | Max),
            Field::Subjects => matches!(strategy, CoalesceByPriority | Union | Longest | ConcatUniqueSorted),
            Field::Authors => matches!(strategy, CoalesceByPriority | Longest),
            Field::Relation => matches!(strategy, CoalesceByPriority),
            Field::Doi
            | Field::Title
            | Field::PublicationDate
            | Field::JournalName
            | Field::Publisher
            | Field::WorkType
            | Field::Abstract
            | Field::SourceUrl
            | Field::SourceDb => true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("{field:?} cannot be merged with {strategy:?}")]
    UnsupportedStrategy { field: Field, strategy: MergeStrategy },
}

/// How the values of one field are reduced across a priority-ordered group.
/// Not every strategy applies to every field; see [`Field::supports`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// First non-missing value, most trusted source first
    CoalesceByPriority,
    /// Set union of list values, sorted
    Union,
    /// Largest non-missing value
    Max,
    /// Longest value; ties go to the most trusted source
    Longest,
    /// Distinct values sorted and joined with `", "`
    ConcatUniqueSorted,
}

/// The standard policy table
pub const FIELD_POLICIES: &[(Field, MergeStrategy)] = &[
    (Field::Doi, MergeStrategy::CoalesceByPriority),
    (Field::Title, MergeStrategy::CoalesceByPriority),
    (Field::Authors, MergeStrategy::Longest),
    (Field::Year, MergeStrategy::CoalesceByPriority),
    (Field::PublicationDate, MergeStrategy::CoalesceByPriority),
    (Field::JournalName, MergeStrategy::CoalesceByPriority),
    (Field::Publisher, MergeStrategy::CoalesceByPriority),
    (Field::WorkType, MergeStrategy::CoalesceByPriority),
    (Field::Abstract, MergeStrategy::CoalesceByPriority),
    (Field::Subjects, MergeStrategy::Union),
    (Field::SourceUrl, MergeStrategy::CoalesceByPriority),
    (Field::CitationCount, MergeStrategy::Max),
    (Field::SourceDb, MergeStrategy::ConcatUniqueSorted),
    (Field::Relation, MergeStrategy::CoalesceByPriority),
];

#[derive(Debug, Clone)]
pub struct MergePolicy {
    policies: Vec<(Field, MergeStrategy)>,
}

impl MergePolicy {
    /// Build a policy, rejecting any binding the field cannot honour
    pub fn new(policies: Vec<(Field, MergeStrategy)>) -> Result<Self, PolicyError> {
        for &(field, strategy) in &policies {
            check_binding(field, strategy)?;
        }
        Ok(Self { policies })
    }

    pub fn standard() -> Self {
        Self {
            policies: FIELD_POLICIES.to_vec(),
        }
    }

    pub fn strategy_for(&self, field: Field) -> Option<MergeStrategy> {
        self.policies
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, s)| *s)
    }

    /// Rebind one field to a different strategy
    pub fn with_strategy(mut self, field: Field, strategy: MergeStrategy) -> Result<Self, PolicyError> {
        check_binding(field, strategy)?;
        match self.policies.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = strategy,
            None => self.policies.push((field, strategy)),
        }
        Ok(self)
    }

    /// Merge a group already sorted most-trusted first.
    /// Fields without a policy entry are left absent/empty.
    pub fn merge(&self, members: &[CanonicalWork]) -> CanonicalWork {
        let mut merged = CanonicalWork {
            doi: None,
            title: None,
            authors: Vec::new(),
            year: None,
            publication_date: None,
            journal_name: None,
            publisher: None,
            work_type: None,
            abstract_text: None,
            subjects: Vec::new(),
            source_url: None,
            citation_count: None,
            source_db: String::new(),
            relation: None,
        };

        for (field, strategy) in &self.policies {
            merge_field(*field, *strategy, members, &mut merged);
        }
        merged
    }
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

fn check_binding(field: Field, strategy: MergeStrategy) -> Result<(), PolicyError> {
    if field.supports(strategy) {
        Ok(())
    } else {
        Err(PolicyError::UnsupportedStrategy { field, strategy })
    }
}

// Bindings reaching here passed `Field::supports`
fn merge_field(field: Field, strategy: MergeStrategy, members: &[CanonicalWork], merged: &mut CanonicalWork) {
    match field {
        Field::Doi => merged.doi = reduce_text(strategy, members, |w| w.doi.as_ref()),
        Field::Title => merged.title = reduce_text(strategy, members, |w| w.title.as_ref()),
        Field::PublicationDate => {
            merged.publication_date = reduce_text(strategy, members, |w| w.publication_date.as_ref())
        }
        Field::JournalName => merged.journal_name = reduce_text(strategy, members, |w| w.journal_name.as_ref()),
        Field::Publisher => merged.publisher = reduce_text(strategy, members, |w| w.publisher.as_ref()),
        Field::WorkType => merged.work_type = reduce_text(strategy, members, |w| w.work_type.as_ref()),
        Field::Abstract => merged.abstract_text = reduce_text(strategy, members, |w| w.abstract_text.as_ref()),
        Field::SourceUrl => merged.source_url = reduce_text(strategy, members, |w| w.source_url.as_ref()),
        Field::Year => merged.year = reduce_number(strategy, members, |w| w.year),
        Field::CitationCount => merged.citation_count = reduce_number(strategy, members, |w| w.citation_count),
        Field::Subjects => merged.subjects = reduce_list(strategy, members, |w| &w.subjects),
        Field::Authors => merged.authors = reduce_authors(strategy, members),
        Field::SourceDb => {
            merged.source_db = reduce_text(strategy, members, |w| Some(&w.source_db)).unwrap_or_default()
        }
        Field::Relation => merged.relation = coalesce(members, |w| w.relation.as_ref()),
    }
}

fn coalesce<'a, T: Clone + 'a>(
    members: &'a [CanonicalWork],
    get: impl Fn(&'a CanonicalWork) -> Option<&'a T>,
) -> Option<T> {
    members.iter().find_map(|w| get(w)).cloned()
}

fn sorted_unique<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    values
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

fn reduce_text<'a>(
    strategy: MergeStrategy,
    members: &'a [CanonicalWork],
    get: impl Fn(&'a CanonicalWork) -> Option<&'a String>,
) -> Option<String> {
    match strategy {
        MergeStrategy::CoalesceByPriority => coalesce(members, get),
        MergeStrategy::Max => members.iter().filter_map(get).max().cloned(),
        MergeStrategy::Longest => longest(members.iter().filter_map(get), |s| s.chars().count()).cloned(),
        MergeStrategy::Union | MergeStrategy::ConcatUniqueSorted => {
            let values = sorted_unique(members.iter().filter_map(get));
            if values.is_empty() {
                None
            } else {
                Some(values.join(SOURCE_DB_SEPARATOR))
            }
        }
    }
}

fn reduce_number(
    strategy: MergeStrategy,
    members: &[CanonicalWork],
    get: impl Fn(&CanonicalWork) -> Option<i64>,
) -> Option<i64> {
    match strategy {
        MergeStrategy::Max => members.iter().filter_map(get).max(),
        _ => members.iter().find_map(get),
    }
}

fn reduce_list<'a>(
    strategy: MergeStrategy,
    members: &'a [CanonicalWork],
    get: impl Fn(&'a CanonicalWork) -> &'a Vec<String>,
) -> Vec<String> {
    match strategy {
        MergeStrategy::Union | MergeStrategy::ConcatUniqueSorted => {
            sorted_unique(members.iter().flat_map(|w| get(w).iter()))
        }
        MergeStrategy::Longest => longest(members.iter().map(get), |v| v.len()).cloned().unwrap_or_default(),
        MergeStrategy::CoalesceByPriority | MergeStrategy::Max => members
            .iter()
            .map(get)
            .find(|v| !v.is_empty())
            .cloned()
            .unwrap_or_default(),
    }
}

fn reduce_authors(strategy: MergeStrategy, members: &[CanonicalWork]) -> Vec<Author> {
    match strategy {
        MergeStrategy::CoalesceByPriority => members
            .iter()
            .map(|w| &w.authors)
            .find(|a| !a.is_empty())
            .cloned()
            .unwrap_or_default(),
        _ => longest(members.iter().map(|w| &w.authors), |a| a.len())
            .cloned()
            .unwrap_or_default(),
    }
}

/// First item of maximal length
fn longest<'a, T: ?Sized>(items: impl Iterator<Item = &'a T>, len: impl Fn(&T) -> usize) -> Option<&'a T> {
    let mut best: Option<&'a T> = None;
    for item in items {
        match best {
            Some(current) if len(item) <= len(current) => {}
            _ => best = Some(item),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Source;

    fn work(source: Source) -> CanonicalWork {
        CanonicalWork::empty(source)
    }

    #[test]
    fn test_coalesce_falls_back_to_lower_priority() {
        let mut openalex = work(Source::OpenAlex);
        openalex.citation_count = Some(9);
        let mut crossref = work(Source::Crossref);
        crossref.publisher = Some("X".to_string());
        crossref.citation_count = Some(5);

        let merged = MergePolicy::standard().merge(&[openalex, crossref]);

        assert_eq!(merged.publisher.as_deref(), Some("X"));
        assert_eq!(merged.citation_count, Some(9));
    }

    #[test]
    fn test_higher_priority_wins_scalar_ties() {
        let mut openalex = work(Source::OpenAlex);
        openalex.title = Some("OpenAlex title".to_string());
        openalex.year = Some(2001);
        let mut crossref = work(Source::Crossref);
        crossref.title = Some("Crossref title".to_string());
        crossref.year = Some(2002);

        let merged = MergePolicy::standard().merge(&[openalex, crossref]);
        assert_eq!(merged.title.as_deref(), Some("OpenAlex title"));
        assert_eq!(merged.year, Some(2001));
    }

    #[test]
    fn test_subjects_union_sorted() {
        let mut a = work(Source::OpenAlex);
        a.subjects = vec!["B".to_string(), "A".to_string()];
        let mut b = work(Source::Crossref);
        b.subjects = vec!["C".to_string(), "B".to_string()];

        let merged = MergePolicy::standard().merge(&[a, b]);
        assert_eq!(merged.subjects, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_longest_author_list_regardless_of_priority() {
        let mut openalex = work(Source::OpenAlex);
        openalex.authors = vec![Author::from_full_name("Solo")];
        let mut crossref = work(Source::Crossref);
        crossref.authors = vec![
            Author::from_full_name("One"),
            Author::from_full_name("Two"),
            Author::from_full_name("Three"),
        ];

        let merged = MergePolicy::standard().merge(&[openalex, crossref]);
        assert_eq!(merged.authors.len(), 3);
        assert_eq!(merged.authors[0].full_name, "One");
    }

    #[test]
    fn test_author_tie_goes_to_first_member() {
        let mut openalex = work(Source::OpenAlex);
        openalex.authors = vec![Author::from_full_name("Maurice Blanchot")];
        let mut crossref = work(Source::Crossref);
        crossref.authors = vec![Author::from_full_name("M. Blanchot")];

        let merged = MergePolicy::standard().merge(&[openalex, crossref]);
        assert_eq!(merged.authors[0].full_name, "Maurice Blanchot");
    }

    #[test]
    fn test_source_db_is_sorted_not_priority_ordered() {
        let merged = MergePolicy::standard().merge(&[
            work(Source::OpenAlex),
            work(Source::Crossref),
            work(Source::Crossref),
        ]);
        assert_eq!(merged.source_db, "Crossref, OpenAlex");
    }

    #[test]
    fn test_citation_count_absent_when_all_missing() {
        let merged = MergePolicy::standard().merge(&[work(Source::OpenAlex), work(Source::Crossref)]);
        assert_eq!(merged.citation_count, None);
    }

    #[test]
    fn test_policy_can_rebind_a_field() {
        let policy = MergePolicy::standard()
            .with_strategy(Field::Year, MergeStrategy::Max)
            .unwrap();
        assert_eq!(policy.strategy_for(Field::Year), Some(MergeStrategy::Max));

        let mut a = work(Source::OpenAlex);
        a.year = Some(1999);
        let mut b = work(Source::Crossref);
        b.year = Some(2003);
        assert_eq!(policy.merge(&[a, b]).year, Some(2003));
    }

    #[test]
    fn test_unsupported_bindings_are_rejected() {
        let err = MergePolicy::standard()
            .with_strategy(Field::Relation, MergeStrategy::Union)
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::UnsupportedStrategy {
                field: Field::Relation,
                strategy: MergeStrategy::Union
            }
        );
        assert!(MergePolicy::standard().with_strategy(Field::Year, MergeStrategy::Union).is_err());
        assert!(MergePolicy::new(vec![(Field::Subjects, MergeStrategy::Max)]).is_err());
        assert!(MergePolicy::new(vec![(Field::Subjects, MergeStrategy::Longest)]).is_ok());
    }

    #[test]
    fn test_standard_table_only_uses_supported_bindings() {
        assert!(MergePolicy::new(FIELD_POLICIES.to_vec()).is_ok());
    }

    #[test]
    fn test_every_field_has_a_standard_policy() {
        let policy = MergePolicy::standard();
        for field in [
            Field::Doi,
            Field::Title,
            Field::Authors,
            Field::Year,
            Field::PublicationDate,
            Field::JournalName,
            Field::Publisher,
            Field::WorkType,
            Field::Abstract,
            Field::Subjects,
            Field::SourceUrl,
            Field::CitationCount,
            Field::SourceDb,
            Field::Relation,
        ] {
            assert!(policy.strategy_for(field).is_some(), "{:?} has no policy", field);
        }
    }
}
