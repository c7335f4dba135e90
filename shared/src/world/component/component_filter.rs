use crate::{ComponentKind, ComponentValue};

/// Predicate over the presence and values of an entity's components.
///
/// Filters compare with `PartialEq` so that resetting a set to an equal
/// filter can be recognized and skipped.
#[derive(Clone, Debug, PartialEq)]
pub enum ComponentFilter {
    /// Entity has a component of this kind
    Has(ComponentKind),
    /// Entity has a component of this kind with exactly this value
    Equals(ComponentKind, ComponentValue),
    Not(Box<ComponentFilter>),
    /// Every inner filter matches. An empty list matches everything.
    And(Vec<ComponentFilter>),
    /// Any inner filter matches. An empty list matches nothing.
    Or(Vec<ComponentFilter>),
}

impl ComponentFilter {
    pub fn has(kind: ComponentKind) -> Self {
        ComponentFilter::Has(kind)
    }

    pub fn equals(kind: ComponentKind, value: impl Into<ComponentValue>) -> Self {
        ComponentFilter::Equals(kind, value.into())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: ComponentFilter) -> Self {
        ComponentFilter::Not(Box::new(filter))
    }

    pub fn and(filters: Vec<ComponentFilter>) -> Self {
        ComponentFilter::And(filters)
    }

    pub fn or(filters: Vec<ComponentFilter>) -> Self {
        ComponentFilter::Or(filters)
    }

    /// Evaluates the filter, reading component values through `lookup`.
    pub fn matches<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&ComponentKind) -> Option<ComponentValue>,
    {
        match self {
            ComponentFilter::Has(kind) => lookup(kind).is_some(),
            ComponentFilter::Equals(kind, expected) => {
                lookup(kind).is_some_and(|value| &value == expected)
            }
            ComponentFilter::Not(inner) => !inner.matches(lookup),
            ComponentFilter::And(filters) => filters.iter().all(|filter| filter.matches(lookup)),
            ComponentFilter::Or(filters) => filters.iter().any(|filter| filter.matches(lookup)),
        }
    }

    /// Every component kind this filter reads, without duplicates
    pub fn kinds(&self) -> Vec<ComponentKind> {
        let mut output = Vec::new();
        self.collect_kinds(&mut output);
        output
    }

    fn collect_kinds(&self, output: &mut Vec<ComponentKind>) {
        match self {
            ComponentFilter::Has(kind) | ComponentFilter::Equals(kind, _) => {
                if !output.contains(kind) {
                    output.push(*kind);
                }
            }
            ComponentFilter::Not(inner) => inner.collect_kinds(output),
            ComponentFilter::And(filters) | ComponentFilter::Or(filters) => {
                for filter in filters {
                    filter.collect_kinds(output);
                }
            }
        }
    }
}
