mod expectation_order_tests;
mod getting_started_tests;
mod response_tests;
mod stub_tests;
