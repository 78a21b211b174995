// HTTP middleware

pub mod cors;
