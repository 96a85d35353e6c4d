//! Fixture lifecycle self-tests

use vigil_harness::{assert, Registry, Suite};

pub fn register(registry: &mut Registry) {
    registry.register(
        Suite::with_factory(FixtureTests::build)
            .test("starts_fresh", FixtureTests::starts_fresh)
            .test("starts_fresh_again", FixtureTests::starts_fresh)
            .test("factory_ran", FixtureTests::factory_ran),
    );
}

/// Fixture built by a fallible factory; every test mutates it
struct FixtureTests {
    visits: usize,
    log: Vec<&'static str>,
}

impl FixtureTests {
    fn build() -> anyhow::Result<Self> {
        Ok(Self {
            visits: 0,
            log: vec!["built"],
        })
    }

    fn starts_fresh(&mut self) -> anyhow::Result<()> {
        self.visits += 1;
        self.log.push("visited");
        assert::equal(self.visits, 1, "visits")?;
        assert::equal(self.log.len(), 2, "log entries")?;
        Ok(())
    }

    fn factory_ran(&mut self) -> anyhow::Result<()> {
        assert::contains(Some(self.log.as_slice()), Some(&"built"), "log")?;
        Ok(())
    }
}
