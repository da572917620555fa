//! State of the transaction create/edit form on the month view.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Closed,
    Creating,
    Editing(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    OpenCreate,
    OpenEdit(i64),
    Cancel,
    Saved,
    Deleted(i64),
}

impl EditorState {
    pub fn apply(self, action: EditorAction) -> Self {
        match (self, action) {
            (_, EditorAction::OpenCreate) => EditorState::Creating,
            (_, EditorAction::OpenEdit(id)) => EditorState::Editing(id),
            (_, EditorAction::Cancel) | (_, EditorAction::Saved) => EditorState::Closed,
            // Deleting the transaction being edited closes the form; other deletes leave it alone
            (EditorState::Editing(current), EditorAction::Deleted(id)) if current == id => EditorState::Closed,
            (state, EditorAction::Deleted(_)) => state,
        }
    }

    /// Reconstructs the state from the month view's query string.
    /// An edit request wins over a create request.
    pub fn from_query(new: bool, edit: Option<i64>) -> Self {
        match (new, edit) {
            (_, Some(id)) => EditorState::Closed.apply(EditorAction::OpenEdit(id)),
            (true, None) => EditorState::Closed.apply(EditorAction::OpenCreate),
            (false, None) => EditorState::Closed,
        }
    }

    /// URL of the month view showing this state.
    pub fn location(&self, month: &str) -> String {
        match self {
            EditorState::Closed => format!("/transactions/{}", month),
            EditorState::Creating => format!("/transactions/{}?new=true", month),
            EditorState::Editing(id) => format!("/transactions/{}?edit={}", month, id),
        }
    }
}
