mod contact_us;
