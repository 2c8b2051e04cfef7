pub mod absentee;
