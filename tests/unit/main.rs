mod master_list_test;
mod reconcile_test;
