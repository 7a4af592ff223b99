mod helpers;
mod test_doctor;
mod test_order;
mod test_publish;
mod test_version;
