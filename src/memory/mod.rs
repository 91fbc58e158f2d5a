mod exp;

pub use exp::Exp;
