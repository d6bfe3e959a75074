/// Where the auth callback sends the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackRoute {
    Dashboard,
    SelectRole,
    Login,
}

impl CallbackRoute {
    pub fn path(&self) -> &'static str {
        match self {
            CallbackRoute::Dashboard => "/dashboard",
            CallbackRoute::SelectRole => "/select-role",
            CallbackRoute::Login => "/login",
        }
    }
}
