// Centralized compile-time diagnostic strings for the annotation macros.

pub(super) const ERR_NAME_MISSING: &str =
    "collection requires a name: #[collection(name = \"...\")] or #[collection(\"...\")]";
pub(super) const ERR_NAME_EMPTY: &str = "collection name must not be empty";
pub(super) const ERR_NAME_DUP: &str = "collection name given more than once";
pub(super) const ERR_UNKNOWN_KEY: &str =
    "unknown argument; expected one of: name, return_type, by_id, accessors";
pub(super) const ERR_DUP_KEY: &str = "argument given more than once";
pub(super) const ERR_OPTION_UNKNOWN_KEY: &str = "unknown argument; expected one of: name, id";
pub(super) const ERR_GENERATED_NO_ARGS: &str = "#[generated] does not accept any arguments";

pub(super) const ERR_COLLECTION_TARGET: &str =
    "collection attributes only support struct, enum or trait declarations";
pub(super) const ERR_OPTION_TARGET: &str = "#[registry_option] only supports struct or enum declarations";
