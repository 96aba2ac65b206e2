//! Mounts the formset on a headless composition and drives it.

use std::rc::Rc;

use formset_core::{location_key, Composition, Key, MemoryApplier, NodeError, NodeId};
use formset_runtime_std::StdRuntime;
use formset_ui::{dispatch_click, ClickError, HtmlRenderer, RenderedNode};

use crate::config::FormSetProps;
use crate::formset::{default_row_renderer, AutorisatieFormSetWith, RowRenderer, ADD_ROW_CLASS};
use crate::rows::rendered_rows;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("formset rendered no markup")]
    Empty,
    #[error("add-row link not found in the rendered formset")]
    AddRowMissing,
    #[error("management field {0} is missing or not a number")]
    ManagementField(String),
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error(transparent)]
    Click(#[from] ClickError),
}

/// A mounted formset.
///
/// Owns the composition and its runtime; the extra-row count lives in the
/// composition and is discarded with it.
pub struct FormSetHost {
    composition: Composition<MemoryApplier>,
    runtime: StdRuntime,
    props: Rc<FormSetProps>,
    row_renderer: RowRenderer,
    root_key: Key,
}

impl FormSetHost {
    pub fn mount(props: FormSetProps) -> Result<Self, HostError> {
        Self::mount_with(props, default_row_renderer())
    }

    pub fn mount_with(props: FormSetProps, row_renderer: RowRenderer) -> Result<Self, HostError> {
        let runtime = StdRuntime::new();
        let mut host = Self {
            composition: Composition::with_runtime(MemoryApplier::new(), runtime.runtime()),
            runtime,
            props: Rc::new(props),
            row_renderer,
            root_key: location_key(file!(), line!(), column!()),
        };
        host.render()?;
        log::info!(
            "mounted formset {:?} with {} supplied rows",
            host.props.config.prefix,
            host.props.form_data.len()
        );
        Ok(host)
    }

    /// Throw away the mounted state and mount the same props again.
    pub fn remount(&mut self) -> Result<(), HostError> {
        let runtime = StdRuntime::new();
        self.composition = Composition::with_runtime(MemoryApplier::new(), runtime.runtime());
        self.runtime = runtime;
        self.render()?;
        log::info!("remounted formset {:?}", self.props.config.prefix);
        Ok(())
    }

    fn render(&mut self) -> Result<(), HostError> {
        let props = Rc::clone(&self.props);
        let row_renderer = Rc::clone(&self.row_renderer);
        self.composition.render(self.root_key, move || {
            AutorisatieFormSetWith(&props, Rc::clone(&row_renderer));
        })?;
        Ok(())
    }

    /// Recompose if a state write asked for a frame. Returns whether work was done.
    pub fn update(&mut self) -> Result<bool, HostError> {
        let requested = self.runtime.take_frame_request();
        if !requested && !self.composition.should_render() {
            return Ok(false);
        }
        self.composition.process_invalid_scopes()?;
        log::debug!("formset recomposed");
        Ok(true)
    }

    pub fn props(&self) -> &FormSetProps {
        &self.props
    }

    pub fn root(&self) -> Option<NodeId> {
        self.composition.root()
    }

    pub fn rendered(&self) -> Result<RenderedNode, HostError> {
        let root = self.root().ok_or(HostError::Empty)?;
        Ok(HtmlRenderer::new(self.composition.applier()).render(root)?)
    }

    pub fn markup(&self) -> Result<String, HostError> {
        Ok(self.rendered()?.to_html())
    }

    /// Click the add-row link the way a user would, then recompose.
    pub fn append_row(&mut self) -> Result<(), HostError> {
        let link = self.add_row_link()?;
        let outcome = dispatch_click(self.composition.applier_mut(), link)?;
        debug_assert!(outcome.default_prevented);
        self.update()?;
        Ok(())
    }

    fn add_row_link(&self) -> Result<NodeId, HostError> {
        let tree = self.rendered()?;
        let link = tree
            .find_by_class(ADD_ROW_CLASS)
            .into_iter()
            .flat_map(|control| control.find_by_tag("a"))
            .map(|link| link.id())
            .next();
        link.ok_or(HostError::AddRowMissing)
    }

    /// Rows currently rendered, whichever row renderer draws them.
    ///
    /// Read back from `TOTAL_FORMS`: supplied rows plus the extra count.
    pub fn row_count(&self) -> Result<usize, HostError> {
        let name = format!("{}-TOTAL_FORMS", self.props.config.prefix);
        let total = self
            .total_forms_field()?
            .and_then(|value| value.parse::<i64>().ok())
            .ok_or(HostError::ManagementField(name))?;
        let rows = &self.props.form_data;
        let extra = total - rows.len() as i64;
        Ok(rendered_rows(rows, extra).len())
    }

    /// Current value of the `{prefix}-TOTAL_FORMS` hidden input.
    pub fn total_forms_field(&self) -> Result<Option<String>, HostError> {
        let name = format!("{}-TOTAL_FORMS", self.props.config.prefix);
        Ok(self.rendered()?.input_value(&name).map(str::to_string))
    }
}
