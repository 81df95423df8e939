use fail::FailScenario;

/// Configures fail points for the lifetime of the value and turns them off on drop.
pub struct CustomFailScenario<'a> {
    _scenario: FailScenario<'a>,
    failpoints: Vec<(String, String)>,
}

impl<'a> CustomFailScenario<'a> {
    /// Sets every `(name, action)` pair, e.g. `("write_batch.before_commit", "1*return->off")`.
    pub fn setup(failpoints: &[(&str, &str)]) -> CustomFailScenario<'a> {
        let scenario = FailScenario::setup();
        let failpoints = failpoints
            .iter()
            .map(|(name, action)| (name.to_string(), action.to_string()))
            .collect::<Vec<_>>();

        for (name, action) in failpoints.iter() {
            fail::cfg(name, action).unwrap()
        }

        Self {
            _scenario: scenario,
            failpoints,
        }
    }

    pub fn teardown(self) {
        drop(self);
    }
}

impl Drop for CustomFailScenario<'_> {
    fn drop(&mut self) {
        for (name, _) in self.failpoints.iter() {
            fail::cfg(name, "off").unwrap()
        }
    }
}
