pub mod customer;
pub mod item;
pub mod purchase;
pub mod sales;
pub mod supplier;
pub mod tax;
