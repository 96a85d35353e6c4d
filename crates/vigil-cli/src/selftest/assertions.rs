//! Assertion library self-tests
//!
//! Failing checks are verified through `throws::<CheckError>` so that the
//! exact failure message is part of what is tested.

use anyhow::Context;
use std::num::ParseIntError;
use vigil_harness::{assert, CheckError, CheckResult, Reflect, Registry, Suite};

pub fn register(registry: &mut Registry) {
    registry.register(
        Suite::<AssertionTests>::new()
            .test("is_none_accepts_none", AssertionTests::is_none_accepts_none)
            .test("is_none_rejects_some", AssertionTests::is_none_rejects_some)
            .test("is_type_checks_runtime_type", AssertionTests::is_type_checks_runtime_type)
            .test("equal_echoes_both_values", AssertionTests::equal_echoes_both_values)
            .test("booleans", AssertionTests::booleans)
            .test("contains_finds_element", AssertionTests::contains_finds_element)
            .test("contains_rejects_missing_arguments", AssertionTests::contains_rejects_missing_arguments)
            .test("throws_matches_type_and_message", AssertionTests::throws_matches_type_and_message)
            .test("throws_rejects_other_errors", AssertionTests::throws_rejects_other_errors),
    );
}

/// Require `check` to fail with exactly `message`
fn rejects(check: impl FnOnce() -> CheckResult, message: &str, label: &str) -> CheckResult {
    assert::throws::<CheckError>(|| Ok(check()?), message, label)
}

struct AssertionTests {
    samples: Vec<i32>,
}

impl Default for AssertionTests {
    fn default() -> Self {
        Self {
            samples: vec![2, 3, 5, 7],
        }
    }
}

impl AssertionTests {
    fn is_none_accepts_none(&mut self) -> anyhow::Result<()> {
        assert::is_none(&None::<u8>, "empty slot")?;
        assert::is_some(&Some(1), "filled slot")?;
        Ok(())
    }

    fn is_none_rejects_some(&mut self) -> anyhow::Result<()> {
        rejects(
            || assert::is_none(&Some(3), "slot"),
            "slot: Expected: `None` Got: `Some(3)`",
            "is_none",
        )?;
        rejects(
            || assert::is_some(&None::<u8>, ""),
            "Expected: `Some(_)` Got: `None`",
            "is_some",
        )?;
        Ok(())
    }

    fn is_type_checks_runtime_type(&mut self) -> anyhow::Result<()> {
        let value: Box<dyn Reflect> = Box::new(42_i64);
        assert::is_type::<i64>(&*value, "boxed")?;
        assert::is_type::<Vec<i32>>(&self.samples, "samples")?;
        rejects(
            || assert::is_type::<u8>(&*value, "boxed"),
            "boxed: Expected: `u8` Got: `i64`",
            "is_type",
        )?;
        Ok(())
    }

    fn equal_echoes_both_values(&mut self) -> anyhow::Result<()> {
        assert::equal(self.samples.len(), 4, "len")?;
        assert::not_equal(self.samples[0], self.samples[1], "distinct")?;
        rejects(
            || assert::equal("got", "want", "name"),
            "name: Expected: `\"want\"` Got: `\"got\"`",
            "equal",
        )?;
        rejects(
            || assert::not_equal(3, 3, ""),
            "Expected a value other than `3`",
            "not_equal",
        )?;
        Ok(())
    }

    #[allow(clippy::eq_op)]
    fn booleans(&mut self) -> anyhow::Result<()> {
        assert::is_true(1 == 1, "one is one")?;
        assert::is_false(1 == 2, "one is two")?;
        rejects(
            || assert::is_true(false, "flag"),
            "flag: Expected: `true` Got: `false`",
            "is_true",
        )?;
        rejects(
            || assert::is_false(true, "flag"),
            "flag: Expected: `false` Got: `true`",
            "is_false",
        )?;
        Ok(())
    }

    fn contains_finds_element(&mut self) -> anyhow::Result<()> {
        assert::contains(Some(self.samples.as_slice()), Some(&5), "primes")?;
        rejects(
            || assert::contains(Some(self.samples.as_slice()), Some(&4), "primes"),
            "primes: Expected to find `4` in collection of 4 but did not",
            "contains",
        )?;
        Ok(())
    }

    fn contains_rejects_missing_arguments(&mut self) -> anyhow::Result<()> {
        rejects(
            || assert::contains(None::<&[i32]>, Some(&1), "c"),
            "c: Collection cannot be null",
            "null collection",
        )?;
        rejects(
            || assert::contains(Some(self.samples.as_slice()), None, "c"),
            "c: Element cannot be null",
            "null element",
        )?;
        Ok(())
    }

    fn throws_matches_type_and_message(&mut self) -> anyhow::Result<()> {
        assert::throws::<ParseIntError>(
            || {
                "x1".parse::<i32>()?;
                Ok(())
            },
            "invalid digit found in string",
            "parse",
        )?;
        Ok(())
    }

    fn throws_rejects_other_errors(&mut self) -> anyhow::Result<()> {
        let wrong_type = assert::throws::<ParseIntError>(|| anyhow::bail!("boom"), "boom", "");
        let message = wrong_type.as_ref().map_err(|e| e.to_string()).err();
        assert::is_some(&message, "wrong type fails")?;
        assert::is_true(
            message.unwrap_or_default().ends_with("Got: different error `boom`"),
            "wrong type message",
        )?;

        let wrapped = assert::throws::<ParseIntError>(
            || {
                "x1".parse::<i32>().context("loading config")?;
                Ok(())
            },
            "invalid digit found in string",
            "",
        );
        assert::is_true(wrapped.is_err(), "context wrapper is a different error")?;

        let no_error = assert::throws::<ParseIntError>(|| Ok(()), "boom", "");
        assert::is_true(no_error.is_err(), "success fails")?;
        Ok(())
    }
}
