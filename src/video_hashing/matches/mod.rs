pub mod duplicate_groups;
