mod builder_tests;
mod extract_tests;
mod property_tests;
