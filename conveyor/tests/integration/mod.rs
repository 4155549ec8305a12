mod fanin_test;
mod pipeline_test;
