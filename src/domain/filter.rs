//! View-scoping rules for projecting the graph into a [`Tree`](crate::Tree).

use std::collections::{BTreeSet, HashSet};

use crate::domain::{Config, Graph, Requirement};

/// Decides which requirements appear in a view, and where.
///
/// - `customer`: at most one. Customer requirements are only admitted when
///   their folio is named after this customer; with no customer set, none
///   are admitted.
/// - `labels`: among siblings, a child carrying one of these is always kept.
/// - `excluded_labels`: labels reserved as unwanted. They are only checked
///   against `labels` for overlap; the child policy does not consult them.
///   A child with a matched label is kept whatever else it carries.
/// - `component`: an optional component scope.
///
/// Every name is compared lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeFilter {
    customer: String,
    labels: BTreeSet<String>,
    excluded_labels: BTreeSet<String>,
    component: Option<String>,
}

/// Errors raised when configuring a [`TreeFilter`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    /// A label appears in both the inclusion and exclusion sets.
    #[error("label '{0}' is both included and excluded")]
    OverlappingLabel(String),

    /// The customer is not listed in the project configuration.
    #[error("unknown customer '{0}'")]
    UnknownCustomer(String),

    /// The component is not listed in the project configuration.
    #[error("unknown component '{0}'")]
    UnknownComponent(String),
}

impl TreeFilter {
    /// Creates a filter.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::OverlappingLabel`] if a label is both included
    /// and excluded.
    pub fn new<I, J>(customer: &str, labels: I, excluded_labels: J) -> Result<Self, FilterError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        J: IntoIterator,
        J::Item: AsRef<str>,
    {
        let labels: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_lowercase())
            .collect();
        let excluded_labels: BTreeSet<String> = excluded_labels
            .into_iter()
            .map(|label| label.as_ref().to_lowercase())
            .collect();

        if let Some(label) = labels.intersection(&excluded_labels).next() {
            return Err(FilterError::OverlappingLabel(label.clone()));
        }

        Ok(Self {
            customer: customer.to_lowercase(),
            labels,
            excluded_labels,
            component: None,
        })
    }

    /// Restricts the filter to a component scope.
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        let component = component.into();
        self.component = (!component.is_empty()).then_some(component);
        self
    }

    /// Check the customer and component against the project vocabulary.
    ///
    /// An empty vocabulary accepts anything.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first unknown customer or component.
    pub fn validate(&self, config: &Config) -> Result<(), FilterError> {
        if !self.customer.is_empty()
            && !config.customers.is_empty()
            && !config.has_customer(&self.customer)
        {
            return Err(FilterError::UnknownCustomer(self.customer.clone()));
        }

        if let Some(component) = &self.component {
            if !config.components.is_empty() && !config.has_component(component) {
                return Err(FilterError::UnknownComponent(component.clone()));
            }
        }

        Ok(())
    }

    /// The customer in scope, or an empty string for none.
    #[must_use]
    pub fn customer(&self) -> &str {
        &self.customer
    }

    /// The inclusion labels.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// The exclusion labels.
    #[must_use]
    pub const fn excluded_labels(&self) -> &BTreeSet<String> {
        &self.excluded_labels
    }

    /// The component scope, if any.
    #[must_use]
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// Whether `requirement` is a project requirement, or a customer
    /// requirement belonging to the customer in scope.
    #[must_use]
    pub fn is_project_or_customer(&self, requirement: &Requirement) -> bool {
        match requirement.customer_name() {
            None if !requirement.is_customer() => true,
            Some(name) => !self.customer.is_empty() && name == self.customer,
            None => false,
        }
    }

    /// Whether `requirement` is a root of this view.
    ///
    /// A requirement with no parents is a root if it is admitted at all. A
    /// requirement whose parents are all excluded from the view (foreign
    /// customer requirements) is promoted to a root.
    #[must_use]
    pub fn is_top_level(&self, graph: &Graph, requirement: &Requirement) -> bool {
        let mut parents = graph.parents(requirement).peekable();
        if parents.peek().is_none() {
            return self.is_project_or_customer(requirement);
        }
        !parents.any(|parent| self.is_project_or_customer(parent))
    }

    /// Split the labels carried by `requirement`'s children into those in
    /// the inclusion set (matched) and the rest (unmatched).
    #[must_use]
    pub fn child_labels(
        &self,
        graph: &Graph,
        requirement: &Requirement,
    ) -> (BTreeSet<String>, BTreeSet<String>) {
        let mut matched = BTreeSet::new();
        let mut unmatched = BTreeSet::new();
        for child in graph.children(requirement) {
            for label in child.labels() {
                if self.labels.contains(label) {
                    matched.insert(label.clone());
                } else {
                    unmatched.insert(label.clone());
                }
            }
        }
        unmatched.retain(|label| !matched.contains(label));
        (matched, unmatched)
    }

    /// Whether `requirement` carries any of `labels`.
    #[must_use]
    pub fn has_label(requirement: &Requirement, labels: &BTreeSet<String>) -> bool {
        requirement
            .labels()
            .iter()
            .any(|label| labels.contains(label))
    }

    /// Whether `requirement` falls within the component scope.
    ///
    /// With no scope set, everything does. Otherwise the requirement is in
    /// scope if it, or any ancestor, has the component. The upward walk stops
    /// with `false` at an ancestor scoped to a different component.
    #[must_use]
    pub fn in_component(&self, graph: &Graph, requirement: &Requirement) -> bool {
        let Some(component) = self.component.as_deref() else {
            return true;
        };
        if requirement.component() == component {
            return true;
        }

        let mut seen = HashSet::new();
        let mut stack: Vec<&Requirement> = graph.parents(requirement).collect();
        while let Some(parent) = stack.pop() {
            if !seen.insert(parent.index().clone()) {
                continue;
            }
            if parent.component() == component {
                return true;
            }
            if !parent.component().is_empty() {
                return false;
            }
            stack.extend(graph.parents(parent));
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{requirement::Relationship, Diagnostics};

    fn requirement(index: &str, source: &str) -> Requirement {
        Requirement::new(index.parse().unwrap(), source)
    }

    fn customer(index: &str, name: &str) -> Requirement {
        let mut req = requirement(index, &format!("customer/{name}.yaml"));
        req.set_kind("customer");
        req
    }

    fn link(graph: &mut Graph, parent: &str, child: &str) {
        let mut diagnostics = Diagnostics::new();
        graph.add_relationship(
            &parent.parse().unwrap(),
            child,
            Relationship::Child,
            &mut diagnostics,
        );
        assert_eq!(diagnostics.problem_count(), 0);
    }

    fn build(reqs: Vec<Requirement>) -> Graph {
        let mut diagnostics = Diagnostics::new();
        let mut graph = Graph::new();
        for req in reqs {
            graph.insert(req, &mut diagnostics);
        }
        graph.link(&mut diagnostics);
        graph
    }

    fn get<'a>(graph: &'a Graph, index: &str) -> &'a Requirement {
        graph.get(&index.parse().unwrap()).unwrap()
    }

    #[test]
    fn overlapping_labels_are_rejected() {
        let err = TreeFilter::new("", ["Critical"], ["critical"]).unwrap_err();
        assert_eq!(err, FilterError::OverlappingLabel("critical".to_string()));
    }

    #[test]
    fn customer_scope_admits_only_matching_customer() {
        let filter = TreeFilter::new("Acme", [] as [&str; 0], [] as [&str; 0]).unwrap();
        assert!(filter.is_project_or_customer(&requirement("r00000001", "project/sw.yaml")));
        assert!(filter.is_project_or_customer(&customer("r00000002", "acme")));
        assert!(!filter.is_project_or_customer(&customer("r00000003", "globex")));

        let internal = TreeFilter::default();
        assert!(!internal.is_project_or_customer(&customer("r00000002", "acme")));
    }

    #[test]
    fn requirement_under_foreign_customers_is_promoted_to_top() {
        let mut graph = build(vec![
            customer("r00000001", "globex"),
            customer("r00000002", "acme"),
            requirement("r00000003", "project/sw.yaml"),
            requirement("r00000004", "project/sw.yaml"),
        ]);
        link(&mut graph, "r00000001", "r00000003");
        link(&mut graph, "r00000002", "r00000004");
        link(&mut graph, "r00000001", "r00000004");

        let acme = TreeFilter::new("acme", [] as [&str; 0], [] as [&str; 0]).unwrap();
        assert!(acme.is_top_level(&graph, get(&graph, "r00000002")));
        assert!(!acme.is_top_level(&graph, get(&graph, "r00000001")));
        assert!(acme.is_top_level(&graph, get(&graph, "r00000003")));
        assert!(!acme.is_top_level(&graph, get(&graph, "r00000004")));

        let internal = TreeFilter::default();
        assert!(internal.is_top_level(&graph, get(&graph, "r00000003")));
        assert!(internal.is_top_level(&graph, get(&graph, "r00000004")));
    }

    #[test]
    fn child_labels_split_on_inclusion_set() {
        let mut critical = requirement("r00000002", "p.yaml");
        critical.add_label("critical");
        critical.add_label("safety");
        let mut nice = requirement("r00000003", "p.yaml");
        nice.add_label("nice-to-have");
        let mut graph = build(vec![requirement("r00000001", "p.yaml"), critical, nice]);
        link(&mut graph, "r00000001", "r00000002");
        link(&mut graph, "r00000001", "r00000003");

        let filter = TreeFilter::new("", ["critical"], [] as [&str; 0]).unwrap();
        let (matched, unmatched) = filter.child_labels(&graph, get(&graph, "r00000001"));
        assert_eq!(matched.into_iter().collect::<Vec<_>>(), ["critical"]);
        assert_eq!(
            unmatched.into_iter().collect::<Vec<_>>(),
            ["nice-to-have", "safety"]
        );
    }

    #[test]
    fn component_scope_walks_ancestors_until_another_component() {
        let mut frontend = requirement("r00000001", "p.yaml");
        frontend.set_component("frontend");
        let mut backend = requirement("r00000002", "p.yaml");
        backend.set_component("backend");
        let mut graph = build(vec![
            frontend,
            backend,
            requirement("r00000003", "p.yaml"),
            requirement("r00000004", "p.yaml"),
            requirement("r00000005", "p.yaml"),
        ]);
        link(&mut graph, "r00000001", "r00000003");
        link(&mut graph, "r00000003", "r00000004");
        link(&mut graph, "r00000002", "r00000005");

        let filter = TreeFilter::default().with_component("frontend");
        assert!(filter.in_component(&graph, get(&graph, "r00000001")));
        assert!(filter.in_component(&graph, get(&graph, "r00000004")));
        assert!(!filter.in_component(&graph, get(&graph, "r00000005")));
        assert!(!filter.in_component(&graph, get(&graph, "r00000002")));

        assert!(TreeFilter::default().in_component(&graph, get(&graph, "r00000005")));
    }

    #[test]
    fn validate_checks_configured_vocabulary() {
        let mut config = Config::default();
        let filter = TreeFilter::new("acme", [] as [&str; 0], [] as [&str; 0])
            .unwrap()
            .with_component("frontend");
        assert_eq!(filter.validate(&config), Ok(()));

        config.customers = vec!["globex".to_string()];
        assert_eq!(
            filter.validate(&config),
            Err(FilterError::UnknownCustomer("acme".to_string()))
        );

        config.customers.push("acme".to_string());
        config.components = vec!["backend".to_string()];
        assert_eq!(
            filter.validate(&config),
            Err(FilterError::UnknownComponent("frontend".to_string()))
        );
    }

}
