//! Internal testing utilities for the arpa crates.

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

/// Utility for creating table-driven tests.
///
/// Lexical resolution tests are mostly long lists of `(word, expected
/// pronunciation)` pairs. Running them in a plain `for` loop stops at the
/// first failure, which hides how many other words are affected. `test_each`
/// runs every case, catching panics, and then reports all failures together.
///
/// To create a table driven test:
///
/// 1. Import the `TestCases` trait
/// 2. Create a struct, conventionally named `Case`, that contains the data
///    for a single test case. This struct must implement `Debug`.
/// 3. Create a collection of `Case` instances, conventionally named `cases`.
/// 4. Call `cases.test_each`, passing the test function as a closure
///
/// ## Example
///
/// ```
/// use arpa_testing::TestCases;
///
/// // Add #[test] attribute
/// fn test_strip_possessive() {
///   #[derive(Debug)]
///   struct Case {
///     word: &'static str,
///     core: Option<&'static str>,
///   }
///
///   let cases = [
///     Case { word: "cat's", core: Some("cat") },
///     Case { word: "cats", core: None },
///   ];
///
///   cases.test_each(|case| {
///     assert_eq!(case.word.strip_suffix("'s"), case.core);
///   });
/// }
/// # test_strip_possessive();
/// ```
///
/// ## Passing cases by reference vs. value
///
/// `test_each` passes the test case to the function by reference, so that it
/// can print the case if the function panics. `test_each_clone` and
/// `test_each_value` pass owned cases instead, at the cost of a clone or a
/// pre-formatted debug string per case.
///
/// ## Unwind safety
///
/// Cases and the test function must be
/// [unwind safe](https://doc.rust-lang.org/std/panic/fn.catch_unwind.html).
/// Tests that need a resolver with an interior-mutable cache should build it
/// inside the test function rather than capturing it.
pub trait TestCases {
    /// The data for a single test case.
    type Case;

    /// Call test function `test` with each test case in `self`, catching any panics.
    ///
    /// After all cases have been evaluated, return if no panics occurred or
    /// panic with details of failing cases otherwise.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;

    /// Variant of [`test_each`](TestCases::test_each) which passes a clone
    /// of each test case to the test function.
    fn test_each_clone(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + Clone + UnwindSafe;

    /// Variant of [`test_each`](TestCases::test_each) which passes test cases
    /// to the test function by value.
    fn test_each_value(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe;
}

/// Panic with a summary of `failures` if it is non-empty.
fn report_failures<F: Debug>(failures: &[F]) {
    assert_eq!(
        failures.len(),
        0,
        "{} test cases failed: {:?}",
        failures.len(),
        failures
    );
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe,
    {
        let failures: Vec<_> = self
            .into_iter()
            .filter(|case| std::panic::catch_unwind(|| test(case)).is_err())
            .collect();
        report_failures(&failures);
    }

    fn test_each_clone(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Clone + Debug + UnwindSafe,
    {
        let test = &test;
        let failures: Vec<_> = self
            .into_iter()
            .filter(|case| {
                let value = case.clone();
                std::panic::catch_unwind(move || test(value)).is_err()
            })
            .collect();
        report_failures(&failures);
    }

    fn test_each_value(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe,
    {
        let test = &test;
        let failures: Vec<String> = self
            .into_iter()
            .filter_map(|case| {
                let case_str = format!("{:?}", case);
                std::panic::catch_unwind(move || test(case))
                    .is_err()
                    .then_some(case_str)
            })
            .collect();
        report_failures(&failures);
    }
}
