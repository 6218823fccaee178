// storefront/src/services/mod.rs

pub mod operator_alerts;
