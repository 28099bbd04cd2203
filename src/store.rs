//! Application-wide viewer state
//!
//! One [`ViewerStore`] lives for the whole application, shared between the
//! render session callbacks and the UI as a [`SharedStore`].

use std::{cell::RefCell, rc::Rc};

use crate::session::ModelDescriptor;

pub type SharedStore = Rc<RefCell<ViewerStore>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerStore {
    pub loading: bool,
    pub current_model: Option<ModelDescriptor>,
}

impl ViewerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh store ready to be handed to several owners
    pub fn shared() -> SharedStore {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_current_model(&mut self, model: ModelDescriptor) {
        log::debug!("current model: {}", model.display_name());
        self.current_model = Some(model);
    }
}
