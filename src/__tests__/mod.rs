mod lexing_test;
mod parsing_test;
mod pipeline_test;
