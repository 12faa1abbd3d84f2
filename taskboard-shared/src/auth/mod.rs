/// Authorization for project and task operations
///
/// # Modules
///
/// - [`authorization`]: Pure role-based permission decisions

pub mod authorization;
