pub mod campaign;
pub mod context;
pub mod partner;
pub mod partner_discount;
