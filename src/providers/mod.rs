pub mod redmine;
