pub mod image_test;
