//! A growable set of autorisatie sub-forms with a server-side formset
//! management block.
//!
//! [`AutorisatieFormSet`] renders the four hidden management counters, a
//! heading, one sub-form per row and an add-row link. Each activation of the
//! link appends one blank row and bumps `TOTAL_FORMS`. [`FormSetHost`] mounts
//! the component headlessly and exposes its markup.

pub mod add_row;
pub mod autorisatie_form;
pub mod config;
pub mod formset;
pub mod host;
pub mod management_form;
pub mod rows;

pub use add_row::{AddRow, DEFAULT_ADD_ROW_CLASS};
pub use autorisatie_form::{field_value, AutorisatieForm, AUTORISATIE_FORM_CLASS};
pub use config::{ConfigError, FormSetConfig, FormSetProps};
pub use formset::{
    default_row_renderer, AutorisatieFormSet, AutorisatieFormSetWith, RowRenderer, ADD_ROW_CLASS,
    ADD_ROW_LABEL, HEADER_CLASS, HEADER_TEXT,
};
pub use host::{FormSetHost, HostError};
pub use management_form::ManagementForm;
pub use rows::{initial_extra, rendered_rows, total_forms, RenderedRow, RowData};

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod config_tests;

#[cfg(test)]
#[path = "tests/component_tests.rs"]
mod component_tests;
