mod common;

mod ledger;
