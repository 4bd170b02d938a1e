mod interrupt_token;

pub use self::interrupt_token::*;
