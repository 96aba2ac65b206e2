#![allow(non_snake_case)]

use formset_ui::{composable, HiddenInput};

/// The four hidden counters the server-side formset reads back.
///
/// `total_forms` is signed: it is whatever the container computed, including
/// a negative sum when more rows were supplied than announced.
#[composable]
pub fn ManagementForm(
    prefix: &str,
    initial_forms: u32,
    total_forms: i64,
    min_num_forms: u32,
    max_num_forms: u32,
) {
    HiddenInput(&format!("{prefix}-TOTAL_FORMS"), &total_forms.to_string());
    HiddenInput(&format!("{prefix}-INITIAL_FORMS"), &initial_forms.to_string());
    HiddenInput(&format!("{prefix}-MIN_NUM_FORMS"), &min_num_forms.to_string());
    HiddenInput(&format!("{prefix}-MAX_NUM_FORMS"), &max_num_forms.to_string());
}
