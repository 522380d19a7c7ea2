/// Policy controlling whether a unit is started by [`Supervisor::start_all`](crate::Supervisor::start_all).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartupPolicy {
    /// Started automatically by `start_all` (default).
    #[default]
    Automatic,
    /// Started only through an explicit [`Supervisor::start_one`](crate::Supervisor::start_one).
    Manual,
}
