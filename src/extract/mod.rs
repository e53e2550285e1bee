//! DOM content location.

pub mod resolver;
pub mod selectors;

pub use resolver::{
    element_text, first_displayed, resolve, resolve_attribute, resolve_first, resolve_text,
    wait_for_any, wait_for_displayed, wait_until_ready,
};
