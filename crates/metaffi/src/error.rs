//! The top-level error every host binding converts into its native
//! failure mechanism at the boundary (§7: "core code never raises").

use metaffi_dispatch::DispatchError;
use metaffi_entity::EntityError;
use metaffi_registry::RegistryError;
use metaffi_serializer::SerializeError;
use metaffi_xllr::XllrError;

#[derive(Debug, thiserror::Error)]
pub enum MetaffiError {
    #[error(transparent)]
    Xllr(#[from] XllrError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
