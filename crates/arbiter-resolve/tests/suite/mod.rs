mod batch;
mod boxing;
mod consistency;
mod inference;
mod interfaces;
mod overriding;
mod varargs;
