pub mod selftest;
