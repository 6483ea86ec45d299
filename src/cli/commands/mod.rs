pub mod records;
pub mod session;
pub mod system;

use crate::cli::registry::CommandRegistry;

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    system::definitions()
        .into_iter()
        .chain(session::definitions())
        .chain(records::definitions())
        .for_each(|entry| registry.register(entry));
}
