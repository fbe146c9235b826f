pub mod messaging_tests;
