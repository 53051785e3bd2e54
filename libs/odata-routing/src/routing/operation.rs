use crate::edm::Operation;
use crate::routing::ActionMap;

impl Operation {
    /// Controller action implementing this operation for a single entity or a collection.
    ///
    /// Candidates, first present in `actions` wins:
    /// `{Name}On{Type}` (or `{Name}OnCollectionOf{Type}`), then `{Name}`.
    #[must_use]
    pub fn select_action(&self, actions: &dyn ActionMap, is_collection: bool) -> Option<String> {
        let name = self.name();
        let Some(binding) = self.binding() else {
            return actions.find_matching_action(&[name]);
        };
        let type_name = binding
            .type_name
            .rsplit_once('.')
            .map_or(binding.type_name.as_str(), |(_, short)| short);
        let specific = if is_collection {
            format!("{name}OnCollectionOf{type_name}")
        } else {
            format!("{name}On{type_name}")
        };
        actions.find_matching_action(&[specific.as_str(), name])
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::edm::{Operation, TypeRef};
    use crate::routing::ActionTable;

    fn wash() -> Operation {
        Operation::action("Sales", "Wash").bound_to(TypeRef::single("Sales.Car"))
    }

    #[test]
    fn test_prefers_type_specific_name() {
        let actions: ActionTable = ["Wash", "WashOnCar", "WashOnCollectionOfCar"]
            .into_iter()
            .collect();
        assert_eq!(wash().select_action(&actions, false).as_deref(), Some("WashOnCar"));
        assert_eq!(
            wash().select_action(&actions, true).as_deref(),
            Some("WashOnCollectionOfCar")
        );
    }

    #[test]
    fn test_falls_back_to_plain_name() {
        let actions = ActionTable::new().with_action("Wash");
        assert_eq!(wash().select_action(&actions, true).as_deref(), Some("Wash"));
        assert_eq!(wash().select_action(&ActionTable::new(), false), None);
    }

    #[test]
    fn test_unbound_uses_plain_name() {
        let reset = Operation::action("Sales", "Reset");
        let actions = ActionTable::new().with_action("ResetOnCar").with_action("Reset");
        assert_eq!(reset.select_action(&actions, false).as_deref(), Some("Reset"));
    }
}
