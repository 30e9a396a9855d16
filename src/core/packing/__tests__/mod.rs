pub mod bit_packer_test;
pub mod budget_test;
