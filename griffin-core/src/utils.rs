//! Utility functions for the provider map

/// Dependency resolution utilities
pub mod dependency {
    use parking_lot::Mutex;

    /// Tracks the types currently being constructed to detect circular dependencies.
    ///
    /// Unlike a plain set, the tracker keeps construction order so that a cycle can
    /// be reported as the full chain that led back to the repeated type.
    #[derive(Debug, Default)]
    pub struct CreationTracker {
        creating: Mutex<Vec<&'static str>>,
    }

    impl CreationTracker {
        /// Creates a new empty creation tracker.
        pub fn new() -> Self {
            Self {
                creating: Mutex::new(Vec::new()),
            }
        }

        /// Checks if a type is currently being created.
        pub fn is_creating(&self, name: &str) -> bool {
            self.creating.lock().iter().any(|n| *n == name)
        }

        /// Marks a type as being created.
        ///
        /// # Errors
        ///
        /// Returns the dependency chain, ending with `name`, if `name` is already
        /// being created further up the stack.
        pub fn start_creating(&self, name: &'static str) -> Result<(), Vec<&'static str>> {
            let mut creating = self.creating.lock();
            if let Some(start) = creating.iter().position(|n| *n == name) {
                let mut cycle = creating[start..].to_vec();
                cycle.push(name);
                return Err(cycle);
            }
            creating.push(name);
            Ok(())
        }

        /// Marks a type as finished being created.
        pub fn finish_creating(&self, name: &str) {
            let mut creating = self.creating.lock();
            if let Some(pos) = creating.iter().rposition(|n| *n == name) {
                creating.remove(pos);
            }
        }

        /// Gets a snapshot of the current construction stack, outermost first.
        pub fn current_creating(&self) -> Vec<&'static str> {
            self.creating.lock().clone()
        }
    }
}

#[cfg(test)]
mod tests {
    mod dependency_tests {
        use super::super::dependency::*;

        #[test]
        fn test_creation_tracker() {
            let tracker = CreationTracker::new();

            assert!(!tracker.is_creating("ServiceA"));

            tracker.start_creating("ServiceA").unwrap();
            assert!(tracker.is_creating("ServiceA"));

            // Re-entering ServiceA is a cycle
            let cycle = tracker.start_creating("ServiceA").unwrap_err();
            assert_eq!(cycle, vec!["ServiceA", "ServiceA"]);

            tracker.finish_creating("ServiceA");
            assert!(!tracker.is_creating("ServiceA"));
        }

        #[test]
        fn test_cycle_reports_chain_from_first_entry() {
            let tracker = CreationTracker::new();

            tracker.start_creating("Controller").unwrap();
            tracker.start_creating("ServiceA").unwrap();
            tracker.start_creating("ServiceB").unwrap();

            let cycle = tracker.start_creating("ServiceA").unwrap_err();
            assert_eq!(cycle, vec!["ServiceA", "ServiceB", "ServiceA"]);
        }

        #[test]
        fn test_current_creating() {
            let tracker = CreationTracker::new();

            tracker.start_creating("ServiceA").unwrap();
            tracker.start_creating("ServiceB").unwrap();
            assert_eq!(tracker.current_creating(), vec!["ServiceA", "ServiceB"]);

            tracker.finish_creating("ServiceB");
            assert_eq!(tracker.current_creating(), vec!["ServiceA"]);
        }
    }
}
