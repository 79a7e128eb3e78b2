mod db_tests;
mod test_helpers;
mod transaction_tests;
