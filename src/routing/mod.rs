mod payload;
mod router;

pub use payload::{
    ActivityResult, ExtraValue, NavigationPayload, ResultCode, ResultPayload, SourceType,
};
pub use router::{PickRequest, ResultRouter};
