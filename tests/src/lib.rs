//! Cross-crate integration tests exercising the end-to-end scenarios of
//! `spec.md` §8 against the `kvstore` back-end through the `engine` driver
//! adapter.

#[cfg(test)]
mod people_scenarios;

#[cfg(test)]
mod catalog_rewrite;
