pub mod docx;
pub mod xls;
