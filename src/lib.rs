mod configure;

pub use ::skiff_core::*;
pub use ::skiff_firebird as firebird;
pub use ::skiff_mssql as mssql;
pub use ::skiff_mysql as mysql;
pub use ::skiff_postgres as postgres;
pub use ::skiff_sqlite as sqlite;
pub use configure::*;
