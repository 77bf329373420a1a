pub(super) mod ensure_app_role;
pub(super) mod migrate;
