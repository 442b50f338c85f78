//! Change detection between two observations of the same class.
//!
//! The dependency graph holds a node's metadata from the previous build
//! (`past`) and the current one, and asks for a [`Diff`]. Each predicate
//! covers one independent field group so the graph can scope rebuilds:
//!
//! | predicate         | fields                        |
//! |-------------------|-------------------------------|
//! | `kind_changed`    | `kind`                        |
//! | `version_changed` | `version`                     |
//! | `data_changed`    | `data1`, `data2`              |
//! | `package_changed` | `package_name`                |
//! | `extra_changed`   | `extra_int`, `extra_string`   |
//!
//! `data1`/`data2` and `extra_int`/`extra_string` are reported together
//! because they are produced and consumed together.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use lazy_static::lazy_static;
use rustc_hash::FxHasher;

use crate::model::MetadataRecord;

/// A comparison result the dependency graph can short-circuit on.
pub trait Difference {
    /// True iff nothing the graph cares about changed.
    fn unchanged(&self) -> bool;
}

/// An entity the dependency graph can pair up across builds and diff.
///
/// Grouping ([`is_same`](DiffCapable::is_same), [`diff_hash`](DiffCapable::diff_hash))
/// decides which old/new pairs are compared at all; [`difference`](DiffCapable::difference)
/// decides what changed within a pair. The two are deliberately independent.
pub trait DiffCapable: Any {
    /// The diff produced for a pair.
    type Diff<'a>: Difference
    where
        Self: 'a;

    /// Whether `other` is the same kind of graph node as `self`.
    fn is_same(&self, other: &dyn Any) -> bool;

    /// Coarse bucketing hash, consistent with [`is_same`](DiffCapable::is_same).
    fn diff_hash(&self) -> u64;

    /// Compares `self` (current) against `past`.
    fn difference<'a>(&'a self, past: &'a Self) -> Self::Diff<'a>;
}

lazy_static! {
    /// Every record shares one bucket, keyed by the record type itself.
    static ref RECORD_DIFF_HASH: u64 = {
        let mut hasher = FxHasher::default();
        TypeId::of::<MetadataRecord>().hash(&mut hasher);
        hasher.finish()
    };
}

impl DiffCapable for MetadataRecord {
    type Diff<'a> = Diff<'a>;

    /// Any two records are the same kind of node, whatever their contents.
    fn is_same(&self, other: &dyn Any) -> bool {
        other.is::<MetadataRecord>()
    }

    fn diff_hash(&self) -> u64 {
        *RECORD_DIFF_HASH
    }

    fn difference<'a>(&'a self, past: &'a Self) -> Diff<'a> {
        Diff {
            past,
            current: self,
        }
    }
}

impl MetadataRecord {
    /// Compares this (current) record against `past`.
    pub fn difference<'a>(&'a self, past: &'a MetadataRecord) -> Diff<'a> {
        DiffCapable::difference(self, past)
    }
}

/// Per-field-group changes between a past and a current record.
///
/// Flags are computed on demand from the borrowed records; each is
/// linear in the size of the fields it covers.
#[derive(Debug, Clone, Copy)]
pub struct Diff<'a> {
    past: &'a MetadataRecord,
    current: &'a MetadataRecord,
}

impl<'a> Diff<'a> {
    /// The record from the previous build.
    pub fn past(&self) -> &'a MetadataRecord {
        self.past
    }

    /// The record from the current build.
    pub fn current(&self) -> &'a MetadataRecord {
        self.current
    }

    /// True iff the `kind` tag differs.
    pub fn kind_changed(&self) -> bool {
        self.past.kind() != self.current.kind()
    }

    /// True iff the `version` sequences differ element-wise or in length.
    pub fn version_changed(&self) -> bool {
        self.past.version() != self.current.version()
    }

    /// True iff `data1` or `data2` differs.
    pub fn data_changed(&self) -> bool {
        self.past.data1() != self.current.data1() || self.past.data2() != self.current.data2()
    }

    /// True iff `package_name` differs.
    pub fn package_changed(&self) -> bool {
        self.past.package_name() != self.current.package_name()
    }

    /// True iff `extra_int` or `extra_string` differs.
    pub fn extra_changed(&self) -> bool {
        self.past.extra_int() != self.current.extra_int()
            || self.past.extra_string() != self.current.extra_string()
    }

    /// True iff none of the five field groups changed.
    pub fn unchanged(&self) -> bool {
        !self.data_changed()
            && !self.kind_changed()
            && !self.version_changed()
            && !self.package_changed()
            && !self.extra_changed()
    }

    /// Evaluates every flag once into a detached summary.
    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            kind: self.kind_changed(),
            version: self.version_changed(),
            data: self.data_changed(),
            package: self.package_changed(),
            extra: self.extra_changed(),
        }
    }
}

impl Difference for Diff<'_> {
    fn unchanged(&self) -> bool {
        Diff::unchanged(self)
    }
}

/// One field group tracked by a [`Diff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeGroup {
    Kind,
    Version,
    Data,
    Package,
    Extra,
}

impl ChangeGroup {
    /// All groups, in reporting order.
    pub const ALL: [ChangeGroup; 5] = [
        ChangeGroup::Kind,
        ChangeGroup::Version,
        ChangeGroup::Data,
        ChangeGroup::Package,
        ChangeGroup::Extra,
    ];

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            ChangeGroup::Kind => "kind",
            ChangeGroup::Version => "version",
            ChangeGroup::Data => "data",
            ChangeGroup::Package => "package",
            ChangeGroup::Extra => "extra",
        }
    }
}

/// Owned snapshot of a [`Diff`]'s flags, independent of the compared records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChangeSummary {
    pub kind: bool,
    pub version: bool,
    pub data: bool,
    pub package: bool,
    pub extra: bool,
}

impl ChangeSummary {
    /// Returns whether the given group changed.
    pub fn contains(&self, group: ChangeGroup) -> bool {
        match group {
            ChangeGroup::Kind => self.kind,
            ChangeGroup::Version => self.version,
            ChangeGroup::Data => self.data,
            ChangeGroup::Package => self.package,
            ChangeGroup::Extra => self.extra,
        }
    }

    /// Iterates over the groups that changed.
    pub fn changed_groups(&self) -> impl Iterator<Item = ChangeGroup> + '_ {
        ChangeGroup::ALL.into_iter().filter(|g| self.contains(*g))
    }

    /// True iff no group changed.
    pub fn is_unchanged(&self) -> bool {
        self.changed_groups().next().is_none()
    }
}

impl Difference for ChangeSummary {
    fn unchanged(&self) -> bool {
        self.is_unchanged()
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unchanged() {
            return f.write_str("unchanged");
        }
        let mut first = true;
        for group in self.changed_groups() {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(group.name())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordBuilder;

    fn record_a() -> MetadataRecord {
        RecordBuilder::new(2)
            .version([1, 0, 3])
            .data1(["X"])
            .data2(["Y"])
            .extra_string("")
            .package_name("com.example")
            .extra_int(0)
            .build()
    }

    /// One mutation per field, paired with the group it must flag.
    fn single_field_mutations() -> Vec<(MetadataRecord, ChangeGroup)> {
        let a = record_a();
        vec![
            (a.to_builder().kind(1).build(), ChangeGroup::Kind),
            (a.to_builder().version([1, 0]).build(), ChangeGroup::Version),
            (a.to_builder().version([1, 0, 4]).build(), ChangeGroup::Version),
            (a.to_builder().data1(["X", "Z"]).build(), ChangeGroup::Data),
            (a.to_builder().data2(Vec::<String>::new()).build(), ChangeGroup::Data),
            (a.to_builder().package_name("com.sample").build(), ChangeGroup::Package),
            (a.to_builder().extra_int(8).build(), ChangeGroup::Extra),
            (a.to_builder().extra_string("Facade").build(), ChangeGroup::Extra),
        ]
    }

    #[test]
    fn test_identical_records_are_unchanged() {
        let a = record_a();
        let b = record_a();
        let diff = b.difference(&a);
        assert!(diff.unchanged());
        assert_eq!(diff.summary(), ChangeSummary::default());
        assert_eq!(diff.summary().to_string(), "unchanged");
    }

    #[test]
    fn test_package_rename_scenario() {
        let a = record_a();
        let b = a.to_builder().package_name("com.sample").build();
        let diff = b.difference(&a);

        assert!(diff.package_changed());
        assert!(!diff.kind_changed());
        assert!(!diff.version_changed());
        assert!(!diff.data_changed());
        assert!(!diff.extra_changed());
        assert!(!diff.unchanged());
    }

    #[test]
    fn test_each_field_sets_exactly_its_group() {
        let past = record_a();
        for (current, group) in single_field_mutations() {
            let summary = current.difference(&past).summary();
            let changed: Vec<_> = summary.changed_groups().collect();
            assert_eq!(changed, vec![group], "mutation of {group:?}: {summary}");
            assert!(!current.difference(&past).unchanged());
        }
    }

    #[test]
    fn test_unchanged_is_symmetric() {
        let a = record_a();
        for (b, _) in single_field_mutations() {
            assert_eq!(b.difference(&a).unchanged(), a.difference(&b).unchanged());
        }
        assert_eq!(a.difference(&a).unchanged(), a.difference(&a).unchanged());
    }

    #[test]
    fn test_diff_exposes_direction() {
        let a = record_a();
        let b = a.to_builder().kind(5).build();
        let diff = b.difference(&a);
        assert_eq!(diff.past().kind(), 2);
        assert_eq!(diff.current().kind(), 5);
    }

    #[test]
    fn test_multiple_groups_display() {
        let a = record_a();
        let b = a.to_builder().data1(["Q"]).package_name("q").build();
        assert_eq!(b.difference(&a).summary().to_string(), "data, package");
    }

    #[test]
    fn test_grouping_identity_ignores_content() {
        let a = record_a();
        let b = RecordBuilder::new(9)
            .version([2])
            .data1(["other"])
            .package_name("elsewhere")
            .extra_int(-1)
            .build();

        assert!(a.is_same(&b));
        assert!(b.is_same(&a));
        assert_eq!(a.diff_hash(), b.diff_hash());
        assert_eq!(a.diff_hash(), MetadataRecord::default().diff_hash());
    }

    #[test]
    fn test_grouping_identity_rejects_other_types() {
        let a = record_a();
        assert!(!a.is_same(&"com.example"));
        assert!(!a.is_same(&42i32));
    }

    #[test]
    fn test_summary_difference_trait() {
        fn unchanged_via_trait(d: &impl Difference) -> bool {
            d.unchanged()
        }
        let a = record_a();
        let b = a.to_builder().extra_int(1).build();
        assert!(!unchanged_via_trait(&b.difference(&a)));
        assert!(!unchanged_via_trait(&b.difference(&a).summary()));
        assert!(unchanged_via_trait(&a.difference(&a)));
    }
}
