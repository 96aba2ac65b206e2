#![allow(non_snake_case)]

use std::rc::Rc;

use formset_core::{useState, with_key, NodeId};
use formset_ui::{composable, Fragment, Heading};

use crate::add_row::AddRow;
use crate::autorisatie_form::AutorisatieForm;
use crate::config::FormSetProps;
use crate::management_form::ManagementForm;
use crate::rows::{initial_extra, rendered_rows, total_forms, RowData};

pub const HEADER_CLASS: &str = "autorisatie-formset__header";
pub const HEADER_TEXT: &str = "Autorisaties";
pub const ADD_ROW_CLASS: &str = "autorisatie-formset__add-row";
pub const ADD_ROW_LABEL: &str = "Nog Autorisaties toevoegen";

/// Renders the sub-form of one row: `(prefix, index, data)`.
pub type RowRenderer = Rc<dyn Fn(&str, usize, Option<&RowData>)>;

pub fn default_row_renderer() -> RowRenderer {
    Rc::new(|prefix: &str, index: usize, data: Option<&RowData>| {
        AutorisatieForm(prefix, index, data);
    })
}

#[composable]
pub fn AutorisatieFormSet(props: &FormSetProps) -> NodeId {
    AutorisatieFormSetWith(props, default_row_renderer())
}

/// The formset with a custom sub-form per row.
///
/// The extra count lives in this call's slot: it starts at
/// `TOTAL_FORMS - form_data.len()`, grows by one per add-row activation and is
/// gone once the composition is dropped.
#[composable]
pub fn AutorisatieFormSetWith(props: &FormSetProps, row_renderer: RowRenderer) -> NodeId {
    let config = &props.config;
    let rows = props.form_data.as_slice();
    let extra = useState(|| {
        let initial = initial_extra(config, rows);
        if initial < 0 {
            log::warn!(
                "formset {:?}: {} rows supplied but TOTAL_FORMS is {}; rendering no blank rows",
                config.prefix,
                rows.len(),
                config.total_forms
            );
        }
        initial
    });
    let current = extra.value();

    Fragment(|| {
        ManagementForm(
            &config.prefix,
            config.initial_forms,
            total_forms(rows, current),
            config.min_num_forms,
            config.max_num_forms,
        );
        Heading(2, HEADER_CLASS, HEADER_TEXT);
        // rows get their own group so an appended row leaves AddRow's slots alone
        with_key(&"rows", || {
            for row in rendered_rows(rows, current) {
                with_key(&row.index, || row_renderer(&config.prefix, row.index, row.data));
            }
        });
        AddRow(Some(ADD_ROW_CLASS), ADD_ROW_LABEL, move |event| {
            event.prevent_default();
            extra.update(|value| *value += 1);
            log::debug!("add-row activated on node #{}", event.target());
        });
    })
}
